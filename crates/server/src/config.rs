//! Service configuration from the environment.
//!
//! Every value has a default. A missing or unparsable variable is logged
//! and replaced by its default rather than aborting startup.

use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use ranking::Limits;
use tracing::{info, warn};

pub const DATA_DIR: &str = "PAW_DATA_DIR";
pub const DEFAULT_PAGE_LIMIT: &str = "PAW_DEFAULT_PAGE_LIMIT";
pub const MAX_PAGE_LIMIT: &str = "PAW_MAX_PAGE_LIMIT";
pub const DEFAULT_RECOMMEND_LIMIT: &str = "PAW_DEFAULT_RECOMMEND_LIMIT";
pub const MAX_RECOMMEND_LIMIT: &str = "PAW_MAX_RECOMMEND_LIMIT";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub page_limits: Limits,
    pub recommend_limits: Limits,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            page_limits: Limits::PAGE,
            recommend_limits: Limits::RECOMMEND,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Config::default();
        let page_limits = Limits::new(
            try_load(&lookup, DEFAULT_PAGE_LIMIT, defaults.page_limits.default),
            try_load(&lookup, MAX_PAGE_LIMIT, defaults.page_limits.max),
        );
        let recommend_limits = Limits::new(
            try_load(&lookup, DEFAULT_RECOMMEND_LIMIT, defaults.recommend_limits.default),
            try_load(&lookup, MAX_RECOMMEND_LIMIT, defaults.recommend_limits.max),
        );

        Self {
            data_dir: try_load(&lookup, DATA_DIR, defaults.data_dir),
            page_limits,
            recommend_limits,
        }
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default:?}");
        return default;
    };

    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default:?}");
        default
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_vars(vars(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.page_limits, Limits::PAGE);
        assert_eq!(config.recommend_limits, Limits::RECOMMEND);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            (DATA_DIR, "/srv/paw"),
            (DEFAULT_PAGE_LIMIT, "10"),
            (MAX_PAGE_LIMIT, "20"),
            (MAX_RECOMMEND_LIMIT, " 30 "),
        ]));
        assert_eq!(config.data_dir, PathBuf::from("/srv/paw"));
        assert_eq!(config.page_limits, Limits::new(10, 20));
        assert_eq!(config.recommend_limits, Limits::new(12, 30));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = Config::from_vars(vars(&[
            (DEFAULT_PAGE_LIMIT, "many"),
            (MAX_PAGE_LIMIT, "-5"),
        ]));
        assert_eq!(config.page_limits, Limits::PAGE);
    }

    #[test]
    fn test_default_above_ceiling_is_capped() {
        let config = Config::from_vars(vars(&[(DEFAULT_RECOMMEND_LIMIT, "80")]));
        assert_eq!(config.recommend_limits.default, 50);
    }
}
