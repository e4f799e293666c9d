//! The panel: session-gated entry point for the UI layer.
//!
//! Owns the store, the clock and the resource caches. Every operation
//! takes the caller's `SessionContext` explicitly; nothing here keeps
//! per-user state between calls.
//!
//! RULES:
//!   - Dashboard operations require `session.can_view_dashboard()`.
//!   - Password reset requires `session.force_reset`.
//!   - Every login, reset and logout outcome is appended to the event log.
//!   - The model and reference data are loaded once per configuration
//!     identity and shared read-only until `reload_resources()`.

use chrono::NaiveDate;
use std::sync::Arc;

use crate::{
    artifacts::{load_bundle, ArtifactLocation, ArtifactStore, FsArtifactStore},
    auth::{Authenticator, LoginStatus},
    cache::ResourceCache,
    clock::{Clock, SystemClock},
    config::PanelConfig,
    credentials::{CredentialAdapter, Provisioned},
    error::{PanelError, PanelResult},
    event::{EventLogEntry, PanelEvent},
    features::forecast_window,
    model::ModelBundle,
    password::PasswordHasher,
    policy::{self, PasswordRequirements},
    reference::ReferenceData,
    session::SessionContext,
    simulator::{PriceBounds, PriceChange, PricingSimulator, SensitivityPoint, SimulationResult},
    store::PanelStore,
};

pub struct Panel {
    config:     PanelConfig,
    store:      PanelStore,
    hasher:     PasswordHasher,
    clock:      Arc<dyn Clock>,
    artifacts:  Box<dyn ArtifactStore>,
    models:     ResourceCache<ArtifactLocation, ModelBundle>,
    references: ResourceCache<String, ReferenceData>,
}

impl Panel {
    /// Open the configured database and artifact root with the system clock.
    pub fn open(config: PanelConfig) -> PanelResult<Self> {
        let store = PanelStore::open(&config.database_path)?;
        store.migrate()?;
        let artifacts = Box::new(FsArtifactStore::new(&config.artifact_root));
        Self::new(config, store, artifacts, Arc::new(SystemClock))
    }

    pub fn new(
        config: PanelConfig,
        store: PanelStore,
        artifacts: Box<dyn ArtifactStore>,
        clock: Arc<dyn Clock>,
    ) -> PanelResult<Self> {
        config.validate().map_err(|e| PanelError::Config(e.to_string()))?;
        let hasher = PasswordHasher::new(&config.hashing)?;
        Ok(Self {
            config,
            store,
            hasher,
            clock,
            artifacts,
            models: ResourceCache::new(),
            references: ResourceCache::new(),
        })
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn store(&self) -> &PanelStore {
        &self.store
    }

    fn authenticator(&self) -> Authenticator<'_, PanelStore> {
        Authenticator::new(
            &self.store,
            &self.hasher,
            self.clock.as_ref(),
            self.config.password_expiry_days,
        )
    }

    fn record(&self, event: PanelEvent) {
        let entry = match EventLogEntry::from_event(&event, self.clock.now()) {
            Ok(e) => e,
            Err(e) => {
                log::warn!("panel: cannot encode {} event: {e}", event.type_name());
                return;
            }
        };
        if let Err(e) = self.store.append_event(&entry) {
            log::warn!("panel: cannot persist {} event: {e}", event.type_name());
        }
    }

    // ── Accounts ───────────────────────────────────────────────

    /// Create a user on an initial password if they do not exist yet.
    pub fn provision_user(&self, username: &str, initial_password: &str) -> PanelResult<Provisioned> {
        CredentialAdapter::new(&self.store, &self.hasher, self.clock.as_ref())
            .provision(username.trim(), initial_password)
    }

    pub fn login(
        &self,
        session: &mut SessionContext,
        username: &str,
        password: &str,
    ) -> PanelResult<LoginStatus> {
        let username = username.trim();
        match self.authenticator().login_into(session, username, password) {
            Ok(status) => {
                self.record(PanelEvent::LoginEvaluated {
                    username: username.to_string(),
                    status,
                });
                Ok(status)
            }
            Err(e @ PanelError::Transport(_)) => {
                log::warn!("panel: credential store unreachable during login user={username}: {e}");
                self.record(PanelEvent::LoginFailedTransport {
                    username: username.to_string(),
                });
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub fn reset_password(
        &self,
        session: &mut SessionContext,
        new_password: &str,
        confirmation: &str,
    ) -> PanelResult<()> {
        let username = session.username.clone();
        let outcome = self
            .authenticator()
            .reset_password(session, new_password, confirmation);
        match &outcome {
            Ok(()) => self.record(PanelEvent::PasswordReset { username }),
            Err(PanelError::Validation(_)) | Err(PanelError::Authentication(_)) => {}
            Err(e) => self.record(PanelEvent::PasswordResetFailed {
                username,
                reason: e.to_string(),
            }),
        }
        outcome
    }

    pub fn logout(&self, session: &mut SessionContext) {
        if !session.username.is_empty() {
            self.record(PanelEvent::LoggedOut {
                username: session.username.clone(),
            });
            log::info!("panel: logout user={}", session.username);
        }
        session.clear();
    }

    /// Live checklist for the reset form; needs no session.
    pub fn password_requirements(&self, password: &str) -> PasswordRequirements {
        policy::evaluate(password)
    }

    pub fn events_for_user(&self, username: &str) -> PanelResult<Vec<PanelEvent>> {
        self.store
            .events_for_user(username)?
            .iter()
            .map(|e| e.decode().map_err(PanelError::from))
            .collect()
    }

    // ── Dashboard ──────────────────────────────────────────────

    fn require_dashboard(&self, session: &SessionContext) -> PanelResult<()> {
        if session.can_view_dashboard() {
            Ok(())
        } else if session.force_reset {
            Err(PanelError::Authentication("password reset required".into()))
        } else {
            Err(PanelError::Authentication("login required".into()))
        }
    }

    pub fn model(&self) -> PanelResult<Arc<ModelBundle>> {
        let location = &self.config.model;
        self.models
            .get_or_load(location, || load_bundle(self.artifacts.as_ref(), location))
    }

    pub fn reference_data(&self) -> PanelResult<Arc<ReferenceData>> {
        let table = &self.config.reference_table;
        self.references
            .get_or_load(table, || ReferenceData::load(&self.store, table))
    }

    /// Drop cached model and reference data; the next request reloads them.
    pub fn reload_resources(&self) {
        self.models.clear();
        self.references.clear();
        log::info!("panel: resource caches cleared");
    }

    /// A simulator over the cached resources, dated today.
    pub fn simulator(&self, session: &SessionContext) -> PanelResult<PricingSimulator> {
        self.require_dashboard(session)?;
        Ok(PricingSimulator::new(
            self.model()?,
            self.reference_data()?,
            self.today(),
            self.config.sensitivity.clone(),
            self.config.price_band,
        ))
    }

    pub fn products(&self, session: &SessionContext) -> PanelResult<Vec<String>> {
        self.require_dashboard(session)?;
        Ok(self
            .reference_data()?
            .item_names()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    pub fn simulate(
        &self,
        session: &SessionContext,
        item_name: &str,
        change: PriceChange,
    ) -> PanelResult<Option<SimulationResult>> {
        self.simulator(session)?.simulate(item_name, change)
    }

    pub fn sensitivity_curve(
        &self,
        session: &SessionContext,
        item_name: &str,
        num_points: Option<usize>,
    ) -> PanelResult<Option<Vec<SensitivityPoint>>> {
        let simulator = self.simulator(session)?;
        let n = num_points.unwrap_or(self.config.sensitivity.points);
        simulator.sensitivity_curve(item_name, n)
    }

    pub fn price_bounds(&self, session: &SessionContext, item_name: &str) -> PanelResult<Option<PriceBounds>> {
        self.require_dashboard(session)?;
        let reference = self.reference_data()?;
        Ok(reference
            .get(item_name)
            .map(|r| PriceBounds::around(r.current_price, self.config.price_band)))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// Current 15-day forecast period shown next to the price controls.
    pub fn forecast_window(&self) -> (NaiveDate, NaiveDate) {
        forecast_window(self.today())
    }
}
