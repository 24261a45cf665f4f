use serde::{Deserialize, Serialize};

/// Closed set of service sectors a request can be classified into.
///
/// `Other` is the generic bucket; the orchestrator only accepts it when the
/// description still looks like a plausible professional request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Software,
    Marketing,
    Construction,
    Events,
    Consulting,
    Commerce,
    Manufacturing,
    Training,
    Other,
}

impl Sector {
    pub const ALL: [Sector; 9] = [
        Sector::Software,
        Sector::Marketing,
        Sector::Construction,
        Sector::Events,
        Sector::Consulting,
        Sector::Commerce,
        Sector::Manufacturing,
        Sector::Training,
        Sector::Other,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Sector::Software => "software",
            Sector::Marketing => "marketing",
            Sector::Construction => "construction",
            Sector::Events => "events",
            Sector::Consulting => "consulting",
            Sector::Commerce => "commerce",
            Sector::Manufacturing => "manufacturing",
            Sector::Training => "training",
            Sector::Other => "other",
        }
    }

    /// Customer-facing sector label used in titles and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Sector::Software => "Desarrollo de software",
            Sector::Marketing => "Marketing y comunicación",
            Sector::Construction => "Construcción y reformas",
            Sector::Events => "Organización de eventos",
            Sector::Consulting => "Consultoría",
            Sector::Commerce => "Comercio",
            Sector::Manufacturing => "Fabricación",
            Sector::Training => "Formación",
            Sector::Other => "Servicios profesionales",
        }
    }

    pub fn from_key(value: &str) -> Option<Sector> {
        let normalized = value.trim().to_ascii_lowercase();
        Sector::ALL.into_iter().find(|sector| sector.key() == normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::Sector;

    #[test]
    fn keys_round_trip() {
        for sector in Sector::ALL {
            assert_eq!(Sector::from_key(sector.key()), Some(sector));
        }
    }

    #[test]
    fn unknown_key_is_none() {
        assert_eq!(Sector::from_key("astrology"), None);
    }
}
