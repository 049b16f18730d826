// ABOUTME: Field mapping editor for the wizard's mapping step
// ABOUTME: Ordered entries with duplicate rejection, auto-mapping, multi-select removal and the phone gate

use std::collections::BTreeSet;
use tracing::debug;

use crate::error::{ConsoleError, Result};
use crate::remote::models::{ConnectionId, MappingEntry, MappingFormat, MappingId};

/// Source property that must feed the destination's primary phone field.
pub const PHONE_PROPERTY: &str = "phone";
pub const PRIMARY_PHONE_FIELD: &str = "number1";

/// Conventional HubSpot property → Five9 contact field pairings used by auto-mapping.
pub const CONVENTIONAL_PAIRINGS: [(&str, &str); 5] = [
    ("firstname", "first_name"),
    ("lastname", "last_name"),
    ("email", "email"),
    (PHONE_PROPERTY, PRIMARY_PHONE_FIELD),
    ("zip", "zip"),
];

/// Candidate values loaded for the mapping step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingCatalog {
    pub properties: Vec<String>,
    pub contact_fields: Vec<String>,
    pub formats: Vec<MappingFormat>,
}

impl MappingCatalog {
    fn default_format_id(&self) -> Option<i64> {
        self.formats.first().map(|f| f.id)
    }
}

/// Wizard selections copied into every new entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingContext {
    pub hubspot_connection_id: Option<ConnectionId>,
    pub hubspot_list_id: Option<String>,
    pub five9_connection_id: Option<ConnectionId>,
    pub five9_dialing_list: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEditor {
    entries: Vec<MappingEntry>,
    // Only ever increases, so ids are never reused after removal.
    next_id: MappingId,
    selected: BTreeSet<MappingId>,
}

impl Default for MappingEditor {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            selected: BTreeSet::new(),
        }
    }
}

impl MappingEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_id(&self) -> MappingId {
        self.next_id
    }

    pub fn selected(&self) -> &BTreeSet<MappingId> {
        &self.selected
    }

    pub fn contains_pair(&self, property: &str, field: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.hubspot_property == property && e.five9_field == field)
    }

    fn push(
        &mut self,
        property: &str,
        field: &str,
        context: &MappingContext,
        format_id: Option<i64>,
    ) -> MappingId {
        let id = self.next_id;
        self.entries.push(MappingEntry {
            id,
            hubspot_connection_id: context.hubspot_connection_id,
            hubspot_list_id: context.hubspot_list_id.clone(),
            five9_connection_id: context.five9_connection_id,
            five9_dialing_list: context.five9_dialing_list.clone(),
            hubspot_property: property.to_string(),
            five9_field: field.to_string(),
            five9_key: 0,
            format_id,
        });
        self.next_id += 1;
        id
    }

    /// Both values must come from the loaded catalog and the pair must be new.
    pub fn add(
        &mut self,
        property: &str,
        field: &str,
        context: &MappingContext,
        catalog: &MappingCatalog,
    ) -> Result<MappingId> {
        let known_property = catalog.properties.iter().any(|p| p == property);
        let known_field = catalog.contact_fields.iter().any(|f| f == field);
        if !known_property || !known_field {
            return Err(ConsoleError::validation(
                "Please select a valid property or contact field.",
            ));
        }
        if self.contains_pair(property, field) {
            return Err(ConsoleError::validation("This mapping already exists."));
        }

        let id = self.push(property, field, context, catalog.default_format_id());
        debug!("Added mapping {} ({} -> {})", id, property, field);
        Ok(id)
    }

    /// Insert the conventional pairings, skipping duplicates. Fails only when nothing was added.
    pub fn auto_map(&mut self, context: &MappingContext, catalog: &MappingCatalog) -> Result<usize> {
        let format_id = catalog.default_format_id();
        let mut added = 0;
        for (property, field) in CONVENTIONAL_PAIRINGS {
            if self.contains_pair(property, field) {
                continue;
            }
            self.push(property, field, context, format_id);
            added += 1;
        }

        if added == 0 {
            return Err(ConsoleError::validation("Default mappings already exist."));
        }
        Ok(added)
    }

    /// Removes every entry whose id is in `ids` and clears the selection. Unknown ids are ignored.
    pub fn remove_selected(&mut self, ids: &BTreeSet<MappingId>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !ids.contains(&e.id));
        self.selected.clear();
        before - self.entries.len()
    }

    pub fn remove_current_selection(&mut self) -> usize {
        let ids = std::mem::take(&mut self.selected);
        self.remove_selected(&ids)
    }

    pub fn toggle_selected(&mut self, id: MappingId) {
        if !self.entries.iter().any(|e| e.id == id) {
            return;
        }
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Select everything unless everything is already selected, in which case clear.
    pub fn toggle_select_all(&mut self) {
        if self.selected.len() == self.entries.len() {
            self.selected.clear();
        } else {
            self.selected = self.entries.iter().map(|e| e.id).collect();
        }
    }

    /// At least one entry, and at least one entry mapping phone to the primary phone field.
    pub fn can_advance(&self) -> bool {
        !self.entries.is_empty() && self.contains_pair(PHONE_PROPERTY, PRIMARY_PHONE_FIELD)
    }
}
