use serde::Deserialize;
use troupe_api::errors::TroupeError;
use troupe_api::handler::ErrorHandler;

/// Mailbox capacity used when a troupe is configured with `mailbox_size = 0`.
pub const DEFAULT_MAILBOX_SIZE: usize = 1;

pub const DEFAULT_THREAD_NAME_PREFIX: &str = "troupe-actor";

// --- Configuration Enums ---

/// How a troupe assigns submitted work to its actors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TroupeMode {
    /// Prefer an idle actor, then grow up to `max`, then rotate through busy
    /// actors oldest-assigned first.
    #[default]
    Dynamic,
    /// Pre-allocate `max` actors and pick one uniformly at random.
    Fixed,
}

// --- Troupe Configuration ---

/// Configuration for a `Troupe`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct TroupeConfig {
    /// Lower population bound. Actors are never removed, so this is only validated.
    pub min: usize,

    /// Upper population bound; must be at least 1.
    pub max: usize,

    /// Actors created eagerly at construction (dynamic mode).
    pub initial: usize,

    /// Mailbox capacity of every actor. Zero is normalised to `DEFAULT_MAILBOX_SIZE`.
    pub mailbox_size: usize,

    /// Assignment strategy.
    pub mode: TroupeMode,

    /// Receives errors returned by work. Attached in code, never deserialized.
    #[serde(skip)]
    pub error_handler: Option<ErrorHandler>,

    /// Prefix of actor thread names; the actor id is appended.
    pub thread_name_prefix: String,

    /// Seed for random assignment. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for TroupeConfig {
    fn default() -> Self {
        Self {
            min: 0,
            max: num_cpus::get(),
            initial: 0,
            mailbox_size: DEFAULT_MAILBOX_SIZE,
            mode: TroupeMode::Dynamic,
            error_handler: None,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
            rng_seed: None,
        }
    }
}

impl TroupeConfig {
    /// A dynamic troupe starting with `initial` actors and growing up to `max`.
    pub fn dynamic(initial: usize, max: usize) -> Self {
        Self { initial, max, mode: TroupeMode::Dynamic, ..Default::default() }
    }

    /// A fixed troupe of exactly `size` actors with random assignment.
    pub fn fixed(size: usize) -> Self {
        Self { min: size, initial: size, max: size, mode: TroupeMode::Fixed, ..Default::default() }
    }

    pub fn with_mailbox_size(mut self, mailbox_size: usize) -> Self {
        self.mailbox_size = mailbox_size;
        self
    }

    pub fn with_error_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(anyhow::Error) + Send + Sync + 'static,
    {
        self.error_handler = Some(ErrorHandler::new(f));
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Check the population bounds and return the effective configuration.
    ///
    /// A zero mailbox size becomes `DEFAULT_MAILBOX_SIZE`. Fixed mode forces
    /// `min = initial = max`.
    pub fn validate(mut self) -> Result<Self, TroupeError> {
        if self.max < self.initial {
            return Err(TroupeError::Configuration(format!(
                "Cannot create Troupe with Max ({}) < Initial ({}) size",
                self.max, self.initial
            )));
        }
        if self.min > self.max {
            return Err(TroupeError::Configuration(format!(
                "Cannot create Troupe with Min ({}) > Max ({}) size",
                self.min, self.max
            )));
        }
        if self.max == 0 {
            return Err(TroupeError::Configuration("Max must be greater than 0".to_string()));
        }
        if self.mailbox_size == 0 {
            self.mailbox_size = DEFAULT_MAILBOX_SIZE;
        }
        if self.mode == TroupeMode::Fixed {
            self.min = self.max;
            self.initial = self.max;
        }
        Ok(self)
    }

    /// The template every actor of this troupe is created from.
    pub fn actor_config(&self) -> ActorConfig {
        ActorConfig {
            mailbox_size: self.mailbox_size,
            error_handler: self.error_handler.clone(),
            thread_name_prefix: self.thread_name_prefix.clone(),
        }
    }
}

// --- Actor Configuration ---

/// Configuration for a single actor.
#[derive(Clone, Debug)]
pub struct ActorConfig {
    /// Capacity of the actor's mailbox; must be at least 1.
    pub mailbox_size: usize,

    /// Receives errors returned by work executed on this actor.
    pub error_handler: Option<ErrorHandler>,

    /// Prefix of the actor's thread name.
    pub thread_name_prefix: String,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_size: DEFAULT_MAILBOX_SIZE,
            error_handler: None,
            thread_name_prefix: DEFAULT_THREAD_NAME_PREFIX.to_string(),
        }
    }
}

impl ActorConfig {
    /// Default settings with the given mailbox capacity.
    pub fn new(mailbox_size: usize) -> Self {
        Self { mailbox_size, ..Default::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_mode_forces_bounds() {
        let config = TroupeConfig { min: 0, initial: 0, max: 4, mode: TroupeMode::Fixed, ..Default::default() }
            .validate()
            .unwrap();

        assert_eq!((config.min, config.initial, config.max), (4, 4, 4));
    }

    #[test]
    fn test_zero_mailbox_is_normalised() {
        let config = TroupeConfig::dynamic(0, 2).with_mailbox_size(0).validate().unwrap();
        assert_eq!(config.mailbox_size, DEFAULT_MAILBOX_SIZE);
        assert_eq!(config.actor_config().mailbox_size, DEFAULT_MAILBOX_SIZE);
    }

    #[test]
    fn test_bound_violations() {
        let cases = [
            TroupeConfig { min: 0, initial: 3, max: 2, ..Default::default() },
            TroupeConfig { min: 3, initial: 0, max: 2, ..Default::default() },
            TroupeConfig { min: 0, initial: 0, max: 0, ..Default::default() },
        ];
        for config in cases {
            assert!(matches!(config.validate(), Err(TroupeError::Configuration(_))));
        }
    }

    #[test]
    fn test_actor_config_carries_handler() {
        let config = TroupeConfig::fixed(2).with_error_handler(|_| {});
        let actor_config = config.actor_config();

        assert!(actor_config.error_handler.is_some());
        assert_eq!(actor_config.thread_name_prefix, DEFAULT_THREAD_NAME_PREFIX);
    }
}
