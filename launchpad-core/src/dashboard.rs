//! Assembles every listing a user's dashboard shows in one round.

use std::sync::Arc;

use launchpad_model::{DashboardApps, DashboardSection};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    database::{
        AppsFanOut, AppsQueryConfig, AppsRepository, QueryOption,
        fan_out_channel, with_limit,
    },
    error::{LaunchpadError, Result},
    permissions::PermissionsGateway,
};

/// Per-deployment inputs to every dashboard load.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    /// Group whose visible apps count as public.
    pub public_group: String,
    /// Index of the favorites category under a workspace root.
    pub favorites_group_index: i32,
    /// Validated PostgreSQL interval text, see [`AppsQueryConfig`].
    pub ranking_window: String,
    /// Row cap applied to every section.
    pub section_limit: Option<u64>,
}

/// Resolves the public set and assembles a user's [`DashboardApps`].
#[derive(Clone)]
pub struct DashboardService {
    apps: Arc<dyn AppsRepository>,
    permissions: Arc<dyn PermissionsGateway>,
    settings: DashboardSettings,
}

impl std::fmt::Debug for DashboardService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl DashboardService {
    /// Wires the listings and the permissions gateway together.
    pub fn new(
        apps: Arc<dyn AppsRepository>,
        permissions: Arc<dyn PermissionsGateway>,
        settings: DashboardSettings,
    ) -> Self {
        Self {
            apps,
            permissions,
            settings,
        }
    }

    /// Resolves the public set, then runs the four listings concurrently.
    ///
    /// Every dispatched listing is awaited before returning. The first
    /// failure, in completion order, cancels the listings still running and
    /// is returned on its own; no partial dashboard is produced. Dropping the
    /// returned future cancels them as well.
    pub async fn load(
        &self,
        username: &str,
        cancel: &CancellationToken,
    ) -> Result<DashboardApps> {
        let app_ids = self
            .permissions
            .public_app_ids(&self.settings.public_group)
            .await?;

        let cfg = Arc::new(AppsQueryConfig {
            username: username.to_owned(),
            groups_index: self.settings.favorites_group_index,
            app_ids,
            start_date_interval: self.settings.ranking_window.clone(),
        });
        let opts: Vec<QueryOption> =
            self.settings.section_limit.map(with_limit).into_iter().collect();

        let scope = cancel.child_token();
        // Dropping `load` mid-flight abandons every listing still running.
        let _abandon = scope.clone().drop_guard();

        let mut pending = JoinSet::new();
        for section in DashboardSection::ALL {
            let (tx, rx) = fan_out_channel(1);
            let (cfg, opts, token) =
                (Arc::clone(&cfg), opts.clone(), scope.clone());
            match section {
                DashboardSection::PopularFeatured => self
                    .apps
                    .popular_featured_apps_async(cfg, opts, token, tx),
                DashboardSection::Public => {
                    self.apps.public_apps_async(cfg, opts, token, tx)
                }
                DashboardSection::RecentlyAdded => self
                    .apps
                    .recently_added_apps_async(cfg, opts, token, tx),
                DashboardSection::RecentlyUsed => self
                    .apps
                    .recently_used_apps_async(cfg, opts, token, tx),
            };
            pending.spawn(async move { (section, rx.recv().await) });
        }

        let mut dashboard = DashboardApps::default();
        let mut failure: Option<LaunchpadError> = None;
        while let Some(joined) = pending.join_next().await {
            let (section, err) = match joined {
                Ok((section, Ok(apps))) => {
                    dashboard.set_section(section, apps);
                    continue;
                }
                Ok((section, Err(err))) => (section.as_str(), err),
                Err(join_err) => {
                    debug!(error = %join_err, "dashboard receiver task failed");
                    ("unknown", LaunchpadError::Dispatch)
                }
            };
            if failure.is_none() {
                warn!(section, error = %err, "dashboard section failed");
                scope.cancel();
                failure = Some(err);
            } else {
                debug!(section, error = %err, "dashboard section abandoned");
            }
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(dashboard),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{database::QuerySettings, error::GatewayError};
    use async_trait::async_trait;
    use launchpad_model::App;
    use reqwest::StatusCode;
    use std::{
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };
    use uuid::Uuid;

    fn app(name: &str) -> App {
        App {
            id: Uuid::new_v4(),
            system_id: launchpad_model::DE_SYSTEM_ID.to_string(),
            name: name.to_string(),
            description: String::new(),
            wiki_url: None,
            integration_date: None,
            edited_date: None,
            username: "ipcdev".into(),
            job_count: None,
            is_favorite: false,
            is_public: true,
            most_recent_start_date: None,
        }
    }

    #[derive(Default)]
    struct FakeApps {
        calls: AtomicUsize,
        fail_recently_used: bool,
        seen: Mutex<Vec<(AppsQueryConfig, Option<u64>)>>,
    }

    impl FakeApps {
        fn record(&self, cfg: AppsQueryConfig, opts: &[QueryOption]) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let limit = QuerySettings::from_options(opts).limit();
            self.seen.lock().unwrap().push((cfg, limit));
        }
    }

    #[async_trait]
    impl AppsRepository for FakeApps {
        async fn popular_featured_apps(
            &self,
            cfg: &AppsQueryConfig,
            opts: &[QueryOption],
        ) -> Result<Vec<App>> {
            self.record(cfg.clone(), opts);
            Ok(vec![app("popular")])
        }

        async fn public_apps(
            &self,
            username: &str,
            groups_index: i32,
            public_app_ids: &[String],
            opts: &[QueryOption],
        ) -> Result<Vec<App>> {
            self.record(
                AppsQueryConfig {
                    username: username.into(),
                    groups_index,
                    app_ids: public_app_ids.to_vec(),
                    start_date_interval: String::new(),
                },
                opts,
            );
            Ok(vec![app("public-1"), app("public-2")])
        }

        async fn recently_added_apps(
            &self,
            username: &str,
            groups_index: i32,
            public_app_ids: &[String],
            opts: &[QueryOption],
        ) -> Result<Vec<App>> {
            self.record(
                AppsQueryConfig {
                    username: username.into(),
                    groups_index,
                    app_ids: public_app_ids.to_vec(),
                    start_date_interval: String::new(),
                },
                opts,
            );
            Ok(Vec::new())
        }

        async fn recently_used_apps(
            &self,
            cfg: &AppsQueryConfig,
            opts: &[QueryOption],
        ) -> Result<Vec<App>> {
            self.record(cfg.clone(), opts);
            if self.fail_recently_used {
                return Err(sqlx::Error::PoolClosed.into());
            }
            Ok(vec![app("used")])
        }
    }

    struct FakeGateway {
        ids: Option<Vec<String>>,
    }

    #[async_trait]
    impl PermissionsGateway for FakeGateway {
        async fn public_app_ids(&self, public_group: &str) -> Result<Vec<String>> {
            assert_eq!(public_group, "de-public");
            match &self.ids {
                Some(ids) => Ok(ids.clone()),
                None => Err(GatewayError::Status(StatusCode::BAD_GATEWAY).into()),
            }
        }
    }

    fn settings() -> DashboardSettings {
        DashboardSettings {
            public_group: "de-public".into(),
            favorites_group_index: 1,
            ranking_window: "2592000 seconds".into(),
            section_limit: Some(10),
        }
    }

    fn service(apps: Arc<FakeApps>, ids: Option<Vec<String>>) -> DashboardService {
        DashboardService::new(apps, Arc::new(FakeGateway { ids }), settings())
    }

    #[tokio::test]
    async fn assembles_every_section() {
        let apps = Arc::new(FakeApps::default());
        let svc = service(Arc::clone(&apps), Some(vec!["id-1".into()]));

        let dashboard = svc
            .load("ipcdev", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(dashboard.popular_featured[0].name, "popular");
        assert_eq!(dashboard.public.len(), 2);
        assert!(dashboard.recently_added.is_empty());
        assert_eq!(dashboard.recently_used[0].name, "used");
        assert_eq!(apps.calls.load(Ordering::SeqCst), 4);

        for (cfg, limit) in apps.seen.lock().unwrap().iter() {
            assert_eq!(cfg.username, "ipcdev");
            assert_eq!(cfg.groups_index, 1);
            assert_eq!(cfg.app_ids, vec!["id-1".to_string()]);
            assert_eq!(*limit, Some(10));
        }
    }

    #[tokio::test]
    async fn gateway_failure_runs_no_listing() {
        let apps = Arc::new(FakeApps::default());
        let svc = service(Arc::clone(&apps), None);

        let err = svc
            .load("ipcdev", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_gateway());
        assert_eq!(apps.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn one_failed_section_fails_the_dashboard() {
        let apps = Arc::new(FakeApps {
            fail_recently_used: true,
            ..FakeApps::default()
        });
        let svc = service(apps, Some(Vec::new()));

        let err = svc
            .load("ipcdev", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, LaunchpadError::Connectivity(_)));
    }

    #[tokio::test]
    async fn cancelled_request_reports_cancellation() {
        let apps = Arc::new(FakeApps::default());
        let svc = service(apps, Some(Vec::new()));
        let token = CancellationToken::new();
        token.cancel();

        let err = svc.load("ipcdev", &token).await.unwrap_err();
        assert!(matches!(err, LaunchpadError::Cancelled));
    }

    /// Listings that take `delay` and count how many ran to completion.
    struct SlowApps {
        delay: Duration,
        fail_recently_used: bool,
        completed: AtomicUsize,
    }

    impl SlowApps {
        fn new(delay: Duration, fail_recently_used: bool) -> Self {
            Self {
                delay,
                fail_recently_used,
                completed: AtomicUsize::new(0),
            }
        }

        async fn finish(&self) -> Result<Vec<App>> {
            tokio::time::sleep(self.delay).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(vec![app("slow")])
        }
    }

    #[async_trait]
    impl AppsRepository for SlowApps {
        async fn popular_featured_apps(
            &self,
            _cfg: &AppsQueryConfig,
            _opts: &[QueryOption],
        ) -> Result<Vec<App>> {
            self.finish().await
        }

        async fn public_apps(
            &self,
            _username: &str,
            _groups_index: i32,
            _public_app_ids: &[String],
            _opts: &[QueryOption],
        ) -> Result<Vec<App>> {
            self.finish().await
        }

        async fn recently_added_apps(
            &self,
            _username: &str,
            _groups_index: i32,
            _public_app_ids: &[String],
            _opts: &[QueryOption],
        ) -> Result<Vec<App>> {
            self.finish().await
        }

        async fn recently_used_apps(
            &self,
            _cfg: &AppsQueryConfig,
            _opts: &[QueryOption],
        ) -> Result<Vec<App>> {
            if self.fail_recently_used {
                return Err(sqlx::Error::PoolClosed.into());
            }
            self.finish().await
        }
    }

    #[tokio::test]
    async fn dropping_load_cancels_running_listings() {
        let apps = Arc::new(SlowApps::new(Duration::from_millis(200), false));
        let svc = DashboardService::new(
            Arc::clone(&apps) as Arc<dyn AppsRepository>,
            Arc::new(FakeGateway {
                ids: Some(Vec::new()),
            }),
            settings(),
        );
        let token = CancellationToken::new();

        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            svc.load("ipcdev", &token),
        )
        .await;
        assert!(timed_out.is_err());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(apps.completed.load(Ordering::SeqCst), 0);
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn late_section_failure_cancels_earlier_sections() {
        let apps = Arc::new(SlowApps::new(Duration::from_secs(30), true));
        let svc = DashboardService::new(
            Arc::clone(&apps) as Arc<dyn AppsRepository>,
            Arc::new(FakeGateway {
                ids: Some(Vec::new()),
            }),
            settings(),
        );

        let err = tokio::time::timeout(
            Duration::from_secs(2),
            svc.load("ipcdev", &CancellationToken::new()),
        )
        .await
        .expect("failure should cancel the slow sections")
        .unwrap_err();

        assert!(matches!(err, LaunchpadError::Connectivity(_)));
        assert_eq!(apps.completed.load(Ordering::SeqCst), 0);
    }
}
