//! Endpoint catalog: the weighted tasks a simulated user chooses from

use crate::error::{SessionError, SessionResult};
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::Rng;
use stampede_config::SessionConfig;

/// Placeholder replaced with the session's subject identifier
pub const SUBJECT_PLACEHOLDER: &str = "%s";

/// One schedulable task: a relative URL template and its selection weight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    name: String,
    template: String,
    weight: u32,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, template: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            weight,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// Whether rendering needs a resolved subject identifier
    pub fn needs_subject(&self) -> bool {
        self.template.contains(SUBJECT_PLACEHOLDER)
    }

    /// Substitute `subject` for every placeholder; an empty subject leaves an empty segment
    pub fn render(&self, subject: &str) -> String {
        self.template.replace(SUBJECT_PLACEHOLDER, subject)
    }
}

/// Weighted set of endpoints
#[derive(Debug, Clone)]
pub struct EndpointCatalog {
    endpoints: Vec<Endpoint>,
    index: WeightedIndex<u32>,
    total_weight: u64,
}

impl EndpointCatalog {
    pub fn new(endpoints: Vec<Endpoint>) -> SessionResult<Self> {
        if endpoints.is_empty() {
            return Err(SessionError::Configuration(
                "endpoint catalog cannot be empty".to_string(),
            ));
        }
        if let Some(endpoint) = endpoints.iter().find(|e| e.weight == 0) {
            return Err(SessionError::Configuration(format!(
                "endpoint '{}' has zero weight",
                endpoint.name
            )));
        }

        let index = WeightedIndex::new(endpoints.iter().map(|e| e.weight)).map_err(|e| {
            SessionError::Configuration(format!("invalid endpoint weights: {}", e))
        })?;
        let total_weight = endpoints.iter().map(|e| u64::from(e.weight)).sum();

        Ok(Self {
            endpoints,
            index,
            total_weight,
        })
    }

    pub fn from_config(config: &SessionConfig) -> SessionResult<Self> {
        Self::new(
            config
                .endpoints
                .iter()
                .map(|e| Endpoint::new(&e.name, &e.path, e.weight))
                .collect(),
        )
    }

    /// Draw one endpoint with probability `weight / total_weight`
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> &Endpoint {
        &self.endpoints[self.index.sample(rng)]
    }

    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    pub fn probability(&self, name: &str) -> Option<f64> {
        self.get(name)
            .map(|e| f64::from(e.weight) / self.total_weight as f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_render() {
        let endpoint = Endpoint::new("patient", "/v1/fhir/Patient/%s?_format=json", 1);
        assert!(endpoint.needs_subject());
        assert_eq!(
            endpoint.render("abc123"),
            "/v1/fhir/Patient/abc123?_format=json"
        );
        assert_eq!(endpoint.render(""), "/v1/fhir/Patient/?_format=json");

        let twice = Endpoint::new("both", "/a/%s/b/%s", 1);
        assert_eq!(twice.render("x"), "/a/x/b/x");

        let plain = Endpoint::new("userinfo", "/v1/connect/userinfo?format=json", 1);
        assert!(!plain.needs_subject());
        assert_eq!(plain.render("ignored"), "/v1/connect/userinfo?format=json");
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(EndpointCatalog::new(Vec::new()).is_err());
    }

    #[test]
    fn test_zero_weight_rejected() {
        let err = EndpointCatalog::new(vec![
            Endpoint::new("a", "/a", 1),
            Endpoint::new("b", "/b", 0),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn test_default_config_catalog() {
        let catalog = EndpointCatalog::from_config(&SessionConfig::default()).unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.probability("explanation_of_benefit"), Some(0.5));
        assert_eq!(catalog.probability("missing"), None);
    }

    #[test]
    fn test_weighted_choice_follows_weights() {
        let catalog = EndpointCatalog::new(vec![
            Endpoint::new("light", "/light", 1),
            Endpoint::new("heavy", "/heavy", 3),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let draws = 8_000;
        let heavy = (0..draws)
            .filter(|_| catalog.choose(&mut rng).name() == "heavy")
            .count();
        let share = heavy as f64 / draws as f64;
        assert!((0.70..0.80).contains(&share), "heavy share was {}", share);
    }
}
