/// Permission checker
///
/// Resolves a user's effective capability set inside an organization and
/// answers authorization queries against it. Resolution joins three facts:
/// the organization exists and is not archived, the user holds an active
/// membership, and the subscription's effective plan. Any gap in that chain
/// denies: archived organizations and non-active memberships resolve to no
/// capabilities at all.
///
/// Resolved (role, plan) pairs are cached per (org, user) with a short TTL so
/// hot request paths do not hit the database on every check. Mutation paths
/// (role changes, member removal, plan changes, archive) call `invalidate` /
/// `invalidate_org` so a stale grant can outlive the change by at most the
/// TTL.
use crate::models::membership::{Membership, MembershipRole};
use crate::models::organization::Organization;
use crate::models::subscription::{PlanTier, Subscription};
use crate::perm::capability::{capabilities_for, Capability};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// How long a resolved (role, plan) pair may be served from cache
const CACHE_TTL: Duration = Duration::from_secs(30);

/// Errors from permission resolution
#[derive(Debug, thiserror::Error)]
pub enum PermError {
    /// The organization does not exist, is archived, or the user is not an
    /// active member. Collapsed into one variant so responses cannot leak
    /// which of the three it was.
    #[error("not found")]
    NotFound,

    /// Database error during resolution
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Clone, Copy)]
struct CacheEntry {
    role: MembershipRole,
    plan: PlanTier,
    resolved_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self) -> bool {
        self.resolved_at.elapsed() < CACHE_TTL
    }
}

/// Read side of permission resolution
///
/// Production wires this to Postgres via `PgPermSource`; tests substitute an
/// in-memory source so every denial branch can be exercised directly.
#[async_trait]
pub trait PermSource: Send + Sync {
    /// The organization, archived or not
    async fn find_org(&self, org_id: Uuid) -> Result<Option<Organization>, sqlx::Error>;

    /// The user's role, if they hold an active membership
    async fn active_role(
        &self,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MembershipRole>, sqlx::Error>;

    /// The organization's subscription row, if one exists
    async fn find_subscription(&self, org_id: Uuid) -> Result<Option<Subscription>, sqlx::Error>;
}

/// Postgres-backed source used in production
#[derive(Clone)]
pub struct PgPermSource {
    pool: PgPool,
}

impl PgPermSource {
    pub fn new(pool: PgPool) -> Self {
        PgPermSource { pool }
    }
}

#[async_trait]
impl PermSource for PgPermSource {
    async fn find_org(&self, org_id: Uuid) -> Result<Option<Organization>, sqlx::Error> {
        Organization::find_by_id(&self.pool, org_id).await
    }

    async fn active_role(
        &self,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<MembershipRole>, sqlx::Error> {
        Membership::active_role(&self.pool, org_id, user_id).await
    }

    async fn find_subscription(&self, org_id: Uuid) -> Result<Option<Subscription>, sqlx::Error> {
        Subscription::find_by_org(&self.pool, org_id).await
    }
}

/// Shared authorization service, cloned cheaply into request handlers
#[derive(Clone)]
pub struct PermissionChecker {
    source: Arc<dyn PermSource>,
    cache: Arc<RwLock<HashMap<(Uuid, Uuid), CacheEntry>>>,
}

impl PermissionChecker {
    pub fn new(pool: PgPool) -> Self {
        Self::with_source(Arc::new(PgPermSource::new(pool)))
    }

    /// Builds a checker over an arbitrary source
    pub fn with_source(source: Arc<dyn PermSource>) -> Self {
        PermissionChecker {
            source,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Resolves the (role, effective plan) pair for a user in an organization
    ///
    /// Fails closed: archived organizations and missing or non-active
    /// memberships all surface as `NotFound`.
    async fn resolve(&self, org_id: Uuid, user_id: Uuid) -> Result<(MembershipRole, PlanTier), PermError> {
        if let Some(entry) = self.cache_get(org_id, user_id) {
            return Ok((entry.role, entry.plan));
        }

        let org = self
            .source
            .find_org(org_id)
            .await?
            .ok_or(PermError::NotFound)?;
        if org.is_archived() {
            return Err(PermError::NotFound);
        }

        let role = self
            .source
            .active_role(org_id, user_id)
            .await?
            .ok_or(PermError::NotFound)?;

        // A missing subscription row is treated as starter, not an error.
        let plan = self
            .source
            .find_subscription(org_id)
            .await?
            .map(|s| s.effective_plan())
            .unwrap_or(PlanTier::Starter);

        self.cache_put(org_id, user_id, role, plan);
        Ok((role, plan))
    }

    /// The user's membership role, if they are an active member
    pub async fn user_role(&self, org_id: Uuid, user_id: Uuid) -> Result<MembershipRole, PermError> {
        let (role, _) = self.resolve(org_id, user_id).await?;
        Ok(role)
    }

    /// The organization's effective plan tier as seen by this user
    pub async fn org_plan(&self, org_id: Uuid, user_id: Uuid) -> Result<PlanTier, PermError> {
        let (_, plan) = self.resolve(org_id, user_id).await?;
        Ok(plan)
    }

    /// The user's full effective capability set
    pub async fn user_permissions(
        &self,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Result<HashSet<Capability>, PermError> {
        let (role, plan) = self.resolve(org_id, user_id).await?;
        Ok(capabilities_for(role, plan))
    }

    /// Whether the user holds every one of the given capabilities
    pub async fn check_all(
        &self,
        org_id: Uuid,
        user_id: Uuid,
        required: &[Capability],
    ) -> Result<bool, PermError> {
        let caps = self.user_permissions(org_id, user_id).await?;
        Ok(required.iter().all(|cap| caps.contains(cap)))
    }

    /// Whether the user holds at least one of the given capabilities
    pub async fn check_any(
        &self,
        org_id: Uuid,
        user_id: Uuid,
        required: &[Capability],
    ) -> Result<bool, PermError> {
        let caps = self.user_permissions(org_id, user_id).await?;
        Ok(required.iter().any(|cap| caps.contains(cap)))
    }

    /// Drops the cached resolution for one user in one organization
    ///
    /// Call after a role change or member removal.
    pub fn invalidate(&self, org_id: Uuid, user_id: Uuid) {
        if let Ok(mut cache) = self.cache.write() {
            cache.remove(&(org_id, user_id));
        }
    }

    /// Drops every cached resolution for an organization
    ///
    /// Call after a plan change or archive, which affects all members.
    pub fn invalidate_org(&self, org_id: Uuid) {
        if let Ok(mut cache) = self.cache.write() {
            cache.retain(|(cached_org, _), _| *cached_org != org_id);
        }
    }

    fn cache_get(&self, org_id: Uuid, user_id: Uuid) -> Option<CacheEntry> {
        let cache = self.cache.read().ok()?;
        cache
            .get(&(org_id, user_id))
            .copied()
            .filter(CacheEntry::is_fresh)
    }

    fn cache_put(&self, org_id: Uuid, user_id: Uuid, role: MembershipRole, plan: PlanTier) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(
                (org_id, user_id),
                CacheEntry {
                    role,
                    plan,
                    resolved_at: Instant::now(),
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::subscription::SubscriptionStatus;
    use chrono::Utc;
    use std::sync::Mutex;

    /// In-memory source covering every resolution branch
    #[derive(Default)]
    struct MemorySource {
        orgs: HashMap<Uuid, Organization>,
        roles: Mutex<HashMap<(Uuid, Uuid), MembershipRole>>,
        subscriptions: HashMap<Uuid, Subscription>,
    }

    impl MemorySource {
        fn with_org(mut self, org_id: Uuid, archived: bool) -> Self {
            let now = Utc::now();
            self.orgs.insert(
                org_id,
                Organization {
                    id: org_id,
                    name: "Harbor Realty".to_string(),
                    owner_user_id: Uuid::new_v4(),
                    archived_at: archived.then(Utc::now),
                    created_at: now,
                    updated_at: now,
                },
            );
            self
        }

        fn with_role(self, org_id: Uuid, user_id: Uuid, role: MembershipRole) -> Self {
            self.roles.lock().unwrap().insert((org_id, user_id), role);
            self
        }

        fn with_subscription(
            mut self,
            org_id: Uuid,
            plan: PlanTier,
            status: SubscriptionStatus,
        ) -> Self {
            let now = Utc::now();
            self.subscriptions.insert(
                org_id,
                Subscription {
                    org_id,
                    plan,
                    status,
                    current_period_start: now,
                    current_period_end: None,
                    created_at: now,
                    updated_at: now,
                },
            );
            self
        }

        fn set_role(&self, org_id: Uuid, user_id: Uuid, role: MembershipRole) {
            self.roles.lock().unwrap().insert((org_id, user_id), role);
        }
    }

    #[async_trait]
    impl PermSource for Arc<MemorySource> {
        async fn find_org(&self, org_id: Uuid) -> Result<Option<Organization>, sqlx::Error> {
            Ok(self.orgs.get(&org_id).cloned())
        }

        async fn active_role(
            &self,
            org_id: Uuid,
            user_id: Uuid,
        ) -> Result<Option<MembershipRole>, sqlx::Error> {
            Ok(self.roles.lock().unwrap().get(&(org_id, user_id)).copied())
        }

        async fn find_subscription(
            &self,
            org_id: Uuid,
        ) -> Result<Option<Subscription>, sqlx::Error> {
            Ok(self.subscriptions.get(&org_id).cloned())
        }
    }

    fn checker(source: &Arc<MemorySource>) -> PermissionChecker {
        PermissionChecker::with_source(Arc::new(Arc::clone(source)))
    }

    #[tokio::test]
    async fn test_resolves_role_plan_and_capabilities() {
        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        let source = Arc::new(
            MemorySource::default()
                .with_org(org, false)
                .with_role(org, user, MembershipRole::Admin)
                .with_subscription(org, PlanTier::Pro, SubscriptionStatus::Active),
        );
        let checker = checker(&source);

        assert_eq!(checker.user_role(org, user).await.unwrap(), MembershipRole::Admin);
        assert_eq!(checker.org_plan(org, user).await.unwrap(), PlanTier::Pro);
        assert_eq!(
            checker.user_permissions(org, user).await.unwrap(),
            capabilities_for(MembershipRole::Admin, PlanTier::Pro)
        );
    }

    #[tokio::test]
    async fn test_missing_org_is_not_found() {
        let source = Arc::new(MemorySource::default());
        let checker = checker(&source);

        let err = checker.user_role(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PermError::NotFound));
    }

    #[tokio::test]
    async fn test_archived_org_is_not_found_even_for_members() {
        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        let source = Arc::new(
            MemorySource::default()
                .with_org(org, true)
                .with_role(org, user, MembershipRole::Owner),
        );
        let checker = checker(&source);

        let err = checker.user_permissions(org, user).await.unwrap_err();
        assert!(matches!(err, PermError::NotFound));
    }

    #[tokio::test]
    async fn test_non_member_is_not_found() {
        let org = Uuid::new_v4();
        let source = Arc::new(MemorySource::default().with_org(org, false));
        let checker = checker(&source);

        let err = checker.user_role(org, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, PermError::NotFound));
    }

    #[tokio::test]
    async fn test_missing_subscription_resolves_to_starter() {
        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        let source = Arc::new(
            MemorySource::default()
                .with_org(org, false)
                .with_role(org, user, MembershipRole::Owner),
        );
        let checker = checker(&source);

        assert_eq!(checker.org_plan(org, user).await.unwrap(), PlanTier::Starter);
        let caps = checker.user_permissions(org, user).await.unwrap();
        assert!(caps.contains(&Capability::LeadsWrite));
        assert!(!caps.contains(&Capability::AutomationsManage));
    }

    #[tokio::test]
    async fn test_canceled_subscription_falls_to_starter_ceiling() {
        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        let source = Arc::new(
            MemorySource::default()
                .with_org(org, false)
                .with_role(org, user, MembershipRole::Admin)
                .with_subscription(org, PlanTier::Enterprise, SubscriptionStatus::Canceled),
        );
        let checker = checker(&source);

        assert_eq!(checker.org_plan(org, user).await.unwrap(), PlanTier::Starter);
        assert!(!checker
            .check_all(org, user, &[Capability::PropertiesRead])
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_cache_serves_stale_role_until_invalidated() {
        let org = Uuid::new_v4();
        let user = Uuid::new_v4();
        let source = Arc::new(
            MemorySource::default()
                .with_org(org, false)
                .with_role(org, user, MembershipRole::Admin),
        );
        let checker = checker(&source);

        assert_eq!(checker.user_role(org, user).await.unwrap(), MembershipRole::Admin);

        source.set_role(org, user, MembershipRole::Viewer);
        assert_eq!(checker.user_role(org, user).await.unwrap(), MembershipRole::Admin);

        checker.invalidate(org, user);
        assert_eq!(checker.user_role(org, user).await.unwrap(), MembershipRole::Viewer);
    }

    #[test]
    fn test_cache_entry_freshness() {
        let entry = CacheEntry {
            role: MembershipRole::Member,
            plan: PlanTier::Growth,
            resolved_at: Instant::now(),
        };
        assert!(entry.is_fresh());

        let stale = CacheEntry {
            resolved_at: Instant::now() - CACHE_TTL - Duration::from_secs(1),
            ..entry
        };
        assert!(!stale.is_fresh());
    }

    #[test]
    fn test_invalidate_is_scoped_to_the_pair() {
        let checker = checker(&Arc::new(MemorySource::default()));
        let org = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        checker.cache_put(org, alice, MembershipRole::Admin, PlanTier::Pro);
        checker.cache_put(org, bob, MembershipRole::Viewer, PlanTier::Pro);

        checker.invalidate(org, alice);
        assert!(checker.cache_get(org, alice).is_none());
        assert!(checker.cache_get(org, bob).is_some());
    }

    #[test]
    fn test_invalidate_org_drops_all_members() {
        let checker = checker(&Arc::new(MemorySource::default()));
        let org = Uuid::new_v4();
        let other_org = Uuid::new_v4();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        checker.cache_put(org, alice, MembershipRole::Owner, PlanTier::Enterprise);
        checker.cache_put(org, bob, MembershipRole::Member, PlanTier::Enterprise);
        checker.cache_put(other_org, alice, MembershipRole::Viewer, PlanTier::Starter);

        checker.invalidate_org(org);
        assert!(checker.cache_get(org, alice).is_none());
        assert!(checker.cache_get(org, bob).is_none());
        assert!(checker.cache_get(other_org, alice).is_some());
    }
}
