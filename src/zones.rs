use chrono_tz::{America, Australia, Tz};

use crate::config::ZoneEntry;
use crate::view::ViewSelection;

/// Word reserved for the "every zone" view; no zone may use it as its id.
pub const ALL_VIEW: &str = "all";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("zone '{0}' is not registered")]
    NotFound(String),
    #[error("zone '{id}' has an invalid timezone '{tz}'")]
    InvalidTimezone { id: String, tz: String },
    #[error("zone id '{0}' is registered more than once")]
    DuplicateId(String),
    #[error("zone id '{0}' is reserved")]
    ReservedId(String),
    #[error("zone ids must not be empty")]
    EmptyId,
    #[error("at least one zone must be registered")]
    NoZones,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneDescriptor {
    pub id: String,
    pub timezone_name: String,
    pub tz: Tz,
    pub city: String,
    pub region: String,
    pub icon: String,
}

/// The fixed set of zones the widget knows about, in registration order.
#[derive(Debug, Clone)]
pub struct ZoneRegistry {
    zones: Vec<ZoneDescriptor>,
}

impl ZoneRegistry {
    pub fn builtin() -> Self {
        let zones = vec![
            builtin_zone("brisbane", Australia::Brisbane, "Brisbane", "Queensland, Australia", "\u{1F998}"),
            builtin_zone("reno", America::Los_Angeles, "Reno", "Nevada, USA", "\u{1F3B0}"),
        ];
        Self { zones }
    }

    /// Validate configured zone entries. Any bad entry rejects the whole set.
    pub fn from_entries(entries: &[ZoneEntry]) -> Result<Self, RegistryError> {
        if entries.is_empty() {
            return Err(RegistryError::NoZones);
        }

        let mut zones: Vec<ZoneDescriptor> = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = entry.id.trim();
            if id.is_empty() {
                return Err(RegistryError::EmptyId);
            }
            if id.eq_ignore_ascii_case(ALL_VIEW) {
                return Err(RegistryError::ReservedId(id.to_string()));
            }
            if zones.iter().any(|z| z.id == id) {
                return Err(RegistryError::DuplicateId(id.to_string()));
            }
            let tz: Tz = entry.tz.parse().map_err(|_| RegistryError::InvalidTimezone {
                id: id.to_string(),
                tz: entry.tz.clone(),
            })?;
            zones.push(ZoneDescriptor {
                id: id.to_string(),
                timezone_name: entry.tz.clone(),
                tz,
                city: entry.city.clone(),
                region: entry.region.clone(),
                icon: entry.icon.clone(),
            });
        }

        Ok(Self { zones })
    }

    pub fn lookup(&self, id: &str) -> Result<&ZoneDescriptor, RegistryError> {
        self.zones
            .iter()
            .find(|z| z.id == id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    pub fn all_zones(&self) -> &[ZoneDescriptor] {
        &self.zones
    }

    pub fn ids(&self) -> Vec<String> {
        self.zones.iter().map(|z| z.id.clone()).collect()
    }

    /// Parse `all` or a registered zone id into a view selection.
    pub fn parse_selection(&self, text: &str) -> Result<ViewSelection, RegistryError> {
        let text = text.trim();
        if text.eq_ignore_ascii_case(ALL_VIEW) {
            return Ok(ViewSelection::All);
        }
        self.lookup(text).map(|z| ViewSelection::Zone(z.id.clone()))
    }
}

fn builtin_zone(id: &str, tz: Tz, city: &str, region: &str, icon: &str) -> ZoneDescriptor {
    ZoneDescriptor {
        id: id.into(),
        timezone_name: tz.name().into(),
        tz,
        city: city.into(),
        region: region.into(),
        icon: icon.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, tz: &str) -> ZoneEntry {
        ZoneEntry {
            id: id.into(),
            tz: tz.into(),
            city: id.into(),
            region: String::new(),
            icon: String::new(),
        }
    }

    #[test]
    fn builtin_registry_keeps_registration_order() {
        let registry = ZoneRegistry::builtin();
        assert_eq!(registry.ids(), vec!["brisbane", "reno"]);
        assert_eq!(registry.all_zones()[0].tz, chrono_tz::Australia::Brisbane);
        assert_eq!(registry.all_zones()[1].tz, chrono_tz::America::Los_Angeles);
    }

    #[test]
    fn lookup_finds_registered_zone() {
        let registry = ZoneRegistry::builtin();
        let reno = registry.lookup("reno").unwrap();
        assert_eq!(reno.city, "Reno");
        assert_eq!(reno.region, "Nevada, USA");
        assert_eq!(reno.timezone_name, "America/Los_Angeles");
    }

    #[test]
    fn lookup_of_unknown_id_is_not_found() {
        let registry = ZoneRegistry::builtin();
        assert_eq!(
            registry.lookup("paris"),
            Err(RegistryError::NotFound("paris".into()))
        );
    }

    #[test]
    fn invalid_timezone_is_rejected_up_front() {
        let err = ZoneRegistry::from_entries(&[entry("mars", "Mars/Olympus_Mons")]).unwrap_err();
        assert_eq!(
            err,
            RegistryError::InvalidTimezone { id: "mars".into(), tz: "Mars/Olympus_Mons".into() }
        );
    }

    #[test]
    fn malformed_registries_are_rejected() {
        assert_eq!(ZoneRegistry::from_entries(&[]).unwrap_err(), RegistryError::NoZones);
        assert_eq!(
            ZoneRegistry::from_entries(&[entry(" ", "UTC")]).unwrap_err(),
            RegistryError::EmptyId
        );
        assert_eq!(
            ZoneRegistry::from_entries(&[entry("All", "UTC")]).unwrap_err(),
            RegistryError::ReservedId("All".into())
        );
        assert_eq!(
            ZoneRegistry::from_entries(&[entry("a", "UTC"), entry("a", "Europe/London")]).unwrap_err(),
            RegistryError::DuplicateId("a".into())
        );
    }

    #[test]
    fn parse_selection_accepts_all_and_known_ids() {
        let registry = ZoneRegistry::builtin();
        assert_eq!(registry.parse_selection("all"), Ok(ViewSelection::All));
        assert_eq!(registry.parse_selection("ALL"), Ok(ViewSelection::All));
        assert_eq!(
            registry.parse_selection("brisbane"),
            Ok(ViewSelection::Zone("brisbane".into()))
        );
        assert!(matches!(
            registry.parse_selection("tokyo"),
            Err(RegistryError::NotFound(_))
        ));
    }
}
