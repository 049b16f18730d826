// ABOUTME: Six-step import wizard: source connection, source list, destination connection,
// ABOUTME: dialing list, field mapping, schedule. Owns session state and cancellable step fetches

use chrono::NaiveDateTime;
use std::collections::BTreeSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::mapping::{MappingCatalog, MappingContext, MappingEditor};
use super::schedule::ScheduleForm;
use crate::error::{ConsoleError, Result};
use crate::remote::models::{
    Connection, ConnectionId, ConnectionType, CreateImportRequest, DialingList, HubSpotList,
    MappingId,
};
use crate::remote::ImportBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    SourceConnection = 1,
    SourceList = 2,
    DestinationConnection = 3,
    DestinationList = 4,
    FieldMapping = 5,
    Schedule = 6,
}

impl Step {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn next(self) -> Option<Step> {
        match self {
            Step::SourceConnection => Some(Step::SourceList),
            Step::SourceList => Some(Step::DestinationConnection),
            Step::DestinationConnection => Some(Step::DestinationList),
            Step::DestinationList => Some(Step::FieldMapping),
            Step::FieldMapping => Some(Step::Schedule),
            Step::Schedule => None,
        }
    }

    pub fn previous(self) -> Option<Step> {
        match self {
            Step::SourceConnection => None,
            Step::SourceList => Some(Step::SourceConnection),
            Step::DestinationConnection => Some(Step::SourceList),
            Step::DestinationList => Some(Step::DestinationConnection),
            Step::FieldMapping => Some(Step::DestinationList),
            Step::Schedule => Some(Step::FieldMapping),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::SourceConnection => "Select a HubSpot Connection",
            Step::SourceList => "Select a HubSpot List",
            Step::DestinationConnection => "Select a Five9 Connection",
            Step::DestinationList => "Select a Five9 Dialing List",
            Step::FieldMapping => "Map HubSpot Properties to Five9 Contact Fields",
            Step::Schedule => "Schedule Import",
        }
    }
}

/// The four upstream choices. Each stays `None` until its step is completed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selections {
    pub hubspot_connection_id: Option<ConnectionId>,
    pub hubspot_list_id: Option<String>,
    pub five9_connection_id: Option<ConnectionId>,
    pub five9_dialing_list: Option<String>,
}

impl Selections {
    pub fn mapping_context(&self) -> MappingContext {
        MappingContext {
            hubspot_connection_id: self.hubspot_connection_id,
            hubspot_list_id: self.hubspot_list_id.clone(),
            five9_connection_id: self.five9_connection_id,
            five9_dialing_list: self.five9_dialing_list.clone(),
        }
    }
}

/// Everything a wizard run accumulates. Going back never clears any of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardSession {
    pub step: Step,
    pub selections: Selections,
    pub mapping: MappingEditor,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self {
            step: Step::SourceConnection,
            selections: Selections::default(),
            mapping: MappingEditor::new(),
        }
    }
}

/// What the active step offers the user to pick from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StepCandidates {
    #[default]
    Empty,
    Connections(Vec<Connection>),
    Lists(Vec<HubSpotList>),
    DialingLists(Vec<DialingList>),
    Catalog(MappingCatalog),
}

/// What a step fetch is keyed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchScope {
    Connections {
        kind: ConnectionType,
        user_uuid: String,
    },
    HubspotLists(ConnectionId),
    DialingLists(ConnectionId),
    Catalog {
        hubspot_connection_id: Option<ConnectionId>,
        five9_connection_id: Option<ConnectionId>,
    },
}

/// A step fetch that has been started but not yet applied.
#[derive(Debug)]
pub struct PendingFetch {
    step: Step,
    generation: u64,
    scope: FetchScope,
    token: CancellationToken,
}

/// Candidates plus the first error of any part that failed and was left empty.
type Fetched = (StepCandidates, Option<ConsoleError>);

#[derive(Debug)]
pub struct FetchOutcome {
    step: Step,
    generation: u64,
    result: Result<Fetched>,
}

impl PendingFetch {
    /// Resolves to `Cancelled` as soon as the owning step is torn down.
    pub async fn run(self, backend: &dyn ImportBackend) -> FetchOutcome {
        let result = tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ConsoleError::Cancelled),
            result = fetch(&self.scope, backend) => result,
        };
        FetchOutcome {
            step: self.step,
            generation: self.generation,
            result,
        }
    }
}

fn or_empty<T>(
    result: Result<Vec<T>>,
    what: &str,
    first_error: &mut Option<ConsoleError>,
) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!("Failed to load {}: {}", what, e);
            first_error.get_or_insert(e);
            Vec::new()
        }
    }
}

async fn fetch(scope: &FetchScope, backend: &dyn ImportBackend) -> Result<Fetched> {
    let candidates = match scope {
        FetchScope::Connections { kind, user_uuid } => backend
            .list_connections_by_type(*kind, user_uuid)
            .await
            .map(StepCandidates::Connections)?,
        FetchScope::HubspotLists(id) => backend
            .list_hubspot_lists(*id)
            .await
            .map(StepCandidates::Lists)?,
        FetchScope::DialingLists(id) => backend
            .list_dialing_lists(*id)
            .await
            .map(StepCandidates::DialingLists)?,
        FetchScope::Catalog {
            hubspot_connection_id,
            five9_connection_id,
        } => {
            let properties = async {
                match hubspot_connection_id {
                    Some(id) => backend.hubspot_properties(*id).await,
                    None => Ok(Vec::new()),
                }
            };
            let contact_fields = async {
                match five9_connection_id {
                    Some(id) => backend.five9_contact_fields(*id).await,
                    None => Ok(Vec::new()),
                }
            };
            // Each part loads on its own; a failed part is left empty.
            let (properties, contact_fields, formats) =
                futures::join!(properties, contact_fields, backend.mapping_formats());
            let mut first_error = None;
            let catalog = MappingCatalog {
                properties: or_empty(properties, "HubSpot properties", &mut first_error),
                contact_fields: or_empty(contact_fields, "Five9 contact fields", &mut first_error),
                formats: or_empty(formats, "mapping formats", &mut first_error),
            };
            return Ok((StepCandidates::Catalog(catalog), first_error));
        }
    };
    Ok((candidates, None))
}

type RefreshCallback = Box<dyn FnMut() + Send>;

/// Drives one wizard run. Steps read the session and request mutations through here.
pub struct WizardController {
    user_uuid: Option<String>,
    session: WizardSession,
    candidates: StepCandidates,
    loading: bool,
    generation: u64,
    inflight: Option<CancellationToken>,
    closed: bool,
    last_error: Option<String>,
    on_saved: Option<RefreshCallback>,
}

impl WizardController {
    pub fn new(user_uuid: Option<String>) -> Self {
        Self {
            user_uuid,
            session: WizardSession::default(),
            candidates: StepCandidates::Empty,
            loading: false,
            generation: 0,
            inflight: None,
            closed: false,
            last_error: None,
            on_saved: None,
        }
    }

    /// Called once after the backend accepts the new import.
    pub fn with_refresh_callback(mut self, callback: impl FnMut() + Send + 'static) -> Self {
        self.on_saved = Some(Box::new(callback));
        self
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    pub fn step(&self) -> Step {
        self.session.step
    }

    pub fn candidates(&self) -> &StepCandidates {
        &self.candidates
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Inline message from the last failed action, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn scope(&self) -> Option<FetchScope> {
        let selections = &self.session.selections;
        match self.session.step {
            Step::SourceConnection => self.user_uuid.clone().map(|user_uuid| FetchScope::Connections {
                kind: ConnectionType::Hubspot,
                user_uuid,
            }),
            Step::SourceList => selections
                .hubspot_connection_id
                .map(FetchScope::HubspotLists),
            Step::DestinationConnection => {
                self.user_uuid.clone().map(|user_uuid| FetchScope::Connections {
                    kind: ConnectionType::Five9,
                    user_uuid,
                })
            }
            Step::DestinationList => selections.five9_connection_id.map(FetchScope::DialingLists),
            Step::FieldMapping => Some(FetchScope::Catalog {
                hubspot_connection_id: selections.hubspot_connection_id,
                five9_connection_id: selections.five9_connection_id,
            }),
            Step::Schedule => None,
        }
    }

    fn cancel_inflight(&mut self) {
        if let Some(token) = self.inflight.take() {
            token.cancel();
        }
        self.loading = false;
    }

    /// Start fetching the active step's candidates, cancelling any earlier fetch.
    ///
    /// Returns `None` when the step has nothing to fetch or its scoping id is missing;
    /// the candidates are then empty.
    pub fn begin_fetch(&mut self) -> Option<PendingFetch> {
        self.cancel_inflight();
        self.generation += 1;
        if self.closed {
            return None;
        }

        let Some(scope) = self.scope() else {
            self.candidates = StepCandidates::Empty;
            return None;
        };

        let token = CancellationToken::new();
        self.inflight = Some(token.clone());
        self.loading = true;
        debug!("Fetching candidates for step {} ({:?})", self.step().number(), scope);
        Some(PendingFetch {
            step: self.session.step,
            generation: self.generation,
            scope,
            token,
        })
    }

    /// Apply a finished fetch. Returns `Ok(false)` when the result is stale and was discarded.
    pub fn apply(&mut self, outcome: FetchOutcome) -> Result<bool> {
        if self.closed || outcome.generation != self.generation || outcome.step != self.session.step
        {
            debug!(
                "Discarding stale fetch for step {} (generation {})",
                outcome.step.number(),
                outcome.generation
            );
            return Ok(false);
        }

        self.inflight = None;
        self.loading = false;
        match outcome.result {
            Ok((candidates, partial)) => {
                self.candidates = candidates;
                self.last_error = partial.map(|e| e.to_string());
                Ok(true)
            }
            Err(ConsoleError::Cancelled) => Ok(false),
            Err(e) => {
                warn!("Failed to load candidates for step {}: {}", outcome.step.number(), e);
                self.candidates = StepCandidates::Empty;
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Fetch and apply in one go, for callers that drive the wizard sequentially.
    pub async fn load(&mut self, backend: &dyn ImportBackend) -> Result<()> {
        if let Some(pending) = self.begin_fetch() {
            let outcome = pending.run(backend).await;
            self.apply(outcome)?;
        }
        Ok(())
    }

    fn ensure_step(&self, expected: Step) -> Result<()> {
        if self.closed {
            return Err(ConsoleError::validation("The wizard has been closed."));
        }
        if self.session.step != expected {
            return Err(ConsoleError::validation(format!(
                "Not on the '{}' step.",
                expected.title()
            )));
        }
        Ok(())
    }

    fn invalid_selection() -> ConsoleError {
        ConsoleError::validation("Invalid selection.")
    }

    pub fn select_hubspot_connection(&mut self, id: ConnectionId) -> Result<()> {
        self.ensure_step(Step::SourceConnection)?;
        match &self.candidates {
            StepCandidates::Connections(list) if list.iter().any(|c| c.id == id) => {
                self.session.selections.hubspot_connection_id = Some(id);
                Ok(())
            }
            _ => Err(Self::invalid_selection()),
        }
    }

    pub fn select_hubspot_list(&mut self, list_id: &str) -> Result<()> {
        self.ensure_step(Step::SourceList)?;
        match &self.candidates {
            StepCandidates::Lists(lists) if lists.iter().any(|l| l.list_id == list_id) => {
                self.session.selections.hubspot_list_id = Some(list_id.to_string());
                Ok(())
            }
            _ => Err(Self::invalid_selection()),
        }
    }

    pub fn select_five9_connection(&mut self, id: ConnectionId) -> Result<()> {
        self.ensure_step(Step::DestinationConnection)?;
        match &self.candidates {
            StepCandidates::Connections(list) if list.iter().any(|c| c.id == id) => {
                self.session.selections.five9_connection_id = Some(id);
                Ok(())
            }
            _ => Err(Self::invalid_selection()),
        }
    }

    pub fn select_dialing_list(&mut self, name: &str) -> Result<()> {
        self.ensure_step(Step::DestinationList)?;
        match &self.candidates {
            StepCandidates::DialingLists(lists) if lists.iter().any(|l| l.name == name) => {
                self.session.selections.five9_dialing_list = Some(name.to_string());
                Ok(())
            }
            _ => Err(Self::invalid_selection()),
        }
    }

    /// Whether the forward action is enabled on the active step.
    pub fn can_advance(&self) -> bool {
        let selections = &self.session.selections;
        !self.closed
            && match self.session.step {
                Step::SourceConnection => selections.hubspot_connection_id.is_some(),
                Step::SourceList => selections.hubspot_list_id.is_some(),
                Step::DestinationConnection => selections.five9_connection_id.is_some(),
                Step::DestinationList => selections.five9_dialing_list.is_some(),
                Step::FieldMapping => self.session.mapping.can_advance(),
                Step::Schedule => false,
            }
    }

    pub fn advance(&mut self) -> Result<Step> {
        if self.closed {
            return Err(ConsoleError::validation("The wizard has been closed."));
        }
        if !self.can_advance() {
            let message = match self.session.step {
                Step::FieldMapping => {
                    "You must map at least 1 phone property to number1 Contact Field."
                }
                Step::Schedule => "Save the schedule to finish the wizard.",
                _ => "Please make a selection before continuing.",
            };
            return Err(ConsoleError::validation(message));
        }

        let next = self.session.step.next().ok_or_else(|| ConsoleError::validation("No next step."))?;
        self.enter(next);
        Ok(next)
    }

    /// Always allowed; keeps every selection and mapping. A no-op on the first step.
    pub fn back(&mut self) -> Step {
        if let Some(previous) = self.session.step.previous() {
            if !self.closed {
                self.enter(previous);
            }
        }
        self.session.step
    }

    fn enter(&mut self, step: Step) {
        self.cancel_inflight();
        self.generation += 1;
        self.candidates = StepCandidates::Empty;
        self.last_error = None;
        self.session.step = step;
        debug!("Wizard moved to step {}", step.number());
    }

    /// Abandon the wizard. Any in-flight fetch is cancelled and its result will be discarded.
    pub fn close(&mut self) {
        self.cancel_inflight();
        self.closed = true;
        debug!("Wizard closed on step {}", self.session.step.number());
    }

    pub fn mapping(&self) -> &MappingEditor {
        &self.session.mapping
    }

    fn catalog(&self) -> MappingCatalog {
        match &self.candidates {
            StepCandidates::Catalog(catalog) => catalog.clone(),
            _ => MappingCatalog::default(),
        }
    }

    pub fn add_mapping(&mut self, property: &str, field: &str) -> Result<MappingId> {
        self.ensure_step(Step::FieldMapping)?;
        let context = self.session.selections.mapping_context();
        let catalog = self.catalog();
        let result = self.session.mapping.add(property, field, &context, &catalog);
        self.track(result)
    }

    pub fn auto_map(&mut self) -> Result<usize> {
        self.ensure_step(Step::FieldMapping)?;
        let context = self.session.selections.mapping_context();
        let catalog = self.catalog();
        let result = self.session.mapping.auto_map(&context, &catalog);
        self.track(result)
    }

    pub fn remove_mappings(&mut self, ids: &BTreeSet<MappingId>) -> Result<usize> {
        self.ensure_step(Step::FieldMapping)?;
        Ok(self.session.mapping.remove_selected(ids))
    }

    pub fn remove_selected_mappings(&mut self) -> Result<usize> {
        self.ensure_step(Step::FieldMapping)?;
        Ok(self.session.mapping.remove_current_selection())
    }

    pub fn toggle_mapping(&mut self, id: MappingId) -> Result<()> {
        self.ensure_step(Step::FieldMapping)?;
        self.session.mapping.toggle_selected(id);
        Ok(())
    }

    pub fn toggle_select_all_mappings(&mut self) -> Result<()> {
        self.ensure_step(Step::FieldMapping)?;
        self.session.mapping.toggle_select_all();
        Ok(())
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => self.last_error = Some(e.to_string()),
        }
        result
    }

    /// Package the session and schedule into a create request without sending it.
    pub fn build_request(&self, schedule: &ScheduleForm) -> Result<CreateImportRequest> {
        let user_uuid = self
            .user_uuid
            .clone()
            .ok_or_else(|| ConsoleError::validation("User UUID not found"))?;
        let parts = schedule.to_parts();
        Ok(CreateImportRequest {
            user_uuid,
            import_name: parts.import_name,
            email_notifications: parts.email_notifications,
            email: parts.email,
            mapping: self.session.mapping.entries().to_vec(),
            schedule: parts.schedule,
        })
    }

    /// Validate and submit. On acceptance the wizard closes and the refresh callback fires;
    /// on any failure the wizard stays on the schedule step with its state intact.
    pub async fn submit(
        &mut self,
        backend: &dyn ImportBackend,
        schedule: &ScheduleForm,
        now: NaiveDateTime,
    ) -> Result<String> {
        self.ensure_step(Step::Schedule)?;
        let request = schedule
            .validate(now)
            .and_then(|_| self.build_request(schedule));
        let request = self.track(request)?;

        match backend.create_import(&request).await {
            Ok(message) => {
                info!(
                    "Import '{}' saved with {} mapping(s)",
                    request.import_name,
                    request.mapping.len()
                );
                self.last_error = None;
                self.closed = true;
                if let Some(callback) = self.on_saved.as_mut() {
                    callback();
                }
                Ok(message)
            }
            Err(e) => {
                warn!("Failed to save import '{}': {}", request.import_name, e);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }
}
