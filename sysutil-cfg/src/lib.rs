//! Runtime configuration for the `sysutil` tools.
//!
//! Every tunable is a `static` [`Config`] declared next to the code that reads it, then
//! registered into a single [`ConfigSet`] at startup. Values can be overridden from the
//! environment with `SYSUTIL_<NAME>`, e.g. `SYSUTIL_COPY_BLOCK_SIZE=65536`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use compact_str::CompactString;

/// Prefix for environment variables that override a [`Config`].
pub static ENV_PREFIX: &str = "SYSUTIL_";

/// A single configuration setting.
pub struct Config<V: ConfigDefault> {
    name: &'static str,
    desc: &'static str,
    value: V,
}

impl<V: ConfigDefault> Config<V> {
    /// Define a new [`Config`] with a default value.
    pub const fn new(name: &'static str, desc: &'static str, default: V) -> Self {
        Config {
            name,
            desc,
            value: default,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Read the value of this [`Config`] from the provided [`ConfigSet`].
    pub fn read(&self, set: &ConfigSet) -> V {
        let Some(entry) = set.configs.get(self.name) else {
            panic!("tried to read unregistered config {}", self.name);
        };
        V::from_shared(&entry.value)
    }
}

/// A cheaply cloneable set of [`Config`]s.
#[derive(Clone, Debug)]
pub struct ConfigSet {
    configs: Arc<BTreeMap<CompactString, ConfigSetEntry>>,
}

impl ConfigSet {
    /// Returns a new [`ConfigSetBuilder`].
    pub fn builder() -> ConfigSetBuilder {
        ConfigSetBuilder::default()
    }

    /// Update [`Config`] in this [`ConfigSet`] with the specified value.
    ///
    /// # Panics
    /// * If [`Config`] was not previously registered with the original [`ConfigSetBuilder`].
    pub fn update<V: ConfigDefault>(&self, config: &'static Config<V>, value: V) {
        let entry = self
            .configs
            .get(config.name)
            .expect("tried to update unregistered config");
        entry.value.update(value.into_dyn());
    }

    /// Update the [`Config`] in this [`ConfigSet`] with `name` to `value`.
    ///
    /// # Errors
    ///
    /// * If no config named `name` exists in this set.
    /// * If the config specified by `name` cannot parse `value`.
    ///
    pub fn try_update(&self, name: &str, value: &str) -> Result<(), anyhow::Error> {
        let entry = self
            .configs
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("no Config named '{name}' found"))?;
        entry.value.update_parse(value)?;
        Ok(())
    }

    /// Apply any `SYSUTIL_<NAME>` overrides found in the environment.
    ///
    /// Values that fail to parse are logged and skipped, the default stays in place.
    pub fn load_env(&self) {
        for name in self.configs.keys() {
            let var = env_var_name(name);
            let Some(value) = sysutil_ore::env::non_empty(&var) else {
                continue;
            };
            match self.try_update(name, &value) {
                Ok(()) => tracing::debug!(%var, %value, "config overridden from environment"),
                Err(err) => tracing::warn!(%var, %value, "ignoring invalid config override: {err}"),
            }
        }
    }
}

impl fmt::Display for ConfigSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, entry) in &*self.configs {
            writeln!(f, "{} => {}\n\t└─ '{}'", name, entry.value, entry.desc)?;
        }
        Ok(())
    }
}

/// Name of the environment variable that overrides the config `name`.
pub fn env_var_name(name: &str) -> String {
    format!("{ENV_PREFIX}{}", name.to_ascii_uppercase())
}

/// Single entry within a [`ConfigSet`].
#[derive(Clone, Debug)]
struct ConfigSetEntry {
    value: DynConfigValueShared,
    desc: &'static str,
}

/// A builder for a [`ConfigSet`].
#[derive(Default, Debug)]
pub struct ConfigSetBuilder {
    configs: BTreeMap<CompactString, (DynConfigValue, &'static str)>,
}

impl ConfigSetBuilder {
    /// Register a [`Config`] into this [`ConfigSetBuilder`] with the default value.
    ///
    /// # Panics
    /// * If a [`Config`] with the same name was already registered.
    pub fn register<V: ConfigDefault>(&mut self, config: &'static Config<V>) -> &mut Self {
        let value = config.value.into_dyn();
        let prev = self
            .configs
            .insert(CompactString::const_new(config.name), (value, config.desc));
        assert!(
            prev.is_none(),
            "config '{}' registered more than once",
            config.name
        );
        self
    }

    /// Consumes this [`ConfigSetBuilder`] construting a [`ConfigSet`].
    pub fn build(self) -> ConfigSet {
        let configs = self
            .configs
            .into_iter()
            .map(|(name, (value, desc))| {
                let entry = ConfigSetEntry {
                    value: value.into_shared(),
                    desc,
                };
                (name, entry)
            })
            .collect();
        ConfigSet {
            configs: Arc::new(configs),
        }
    }
}

/// Types that can be the value of a [`Config`].
pub trait ConfigDefault: Copy {
    fn into_dyn(&self) -> DynConfigValue;
    fn from_shared(val: &DynConfigValueShared) -> Self;
}

impl ConfigDefault for bool {
    fn into_dyn(&self) -> DynConfigValue {
        DynConfigValue::Bool(*self)
    }

    fn from_shared(val: &DynConfigValueShared) -> Self {
        let DynConfigValueShared::Bool(val) = val else {
            panic!("programming error, found {val:?} for bool")
        };
        val.load(Ordering::SeqCst)
    }
}

impl ConfigDefault for u64 {
    fn into_dyn(&self) -> DynConfigValue {
        DynConfigValue::U64(*self)
    }

    fn from_shared(val: &DynConfigValueShared) -> Self {
        let DynConfigValueShared::U64(val) = val else {
            panic!("programming error, found {val:?} for u64")
        };
        val.load(Ordering::SeqCst)
    }
}

/// "Type erased" configuration values.
#[derive(Debug)]
pub enum DynConfigValue {
    Bool(bool),
    U64(u64),
}

impl DynConfigValue {
    fn into_shared(self) -> DynConfigValueShared {
        match self {
            DynConfigValue::Bool(val) => DynConfigValueShared::Bool(Arc::new(AtomicBool::new(val))),
            DynConfigValue::U64(val) => DynConfigValueShared::U64(Arc::new(AtomicU64::new(val))),
        }
    }
}

/// Shareable instance of [`DynConfigValue`].
#[derive(Clone, Debug)]
pub enum DynConfigValueShared {
    Bool(Arc<AtomicBool>),
    U64(Arc<AtomicU64>),
}

impl DynConfigValueShared {
    fn update(&self, value: DynConfigValue) {
        match (self, value) {
            (DynConfigValueShared::Bool(shared), DynConfigValue::Bool(val)) => {
                shared.store(val, Ordering::SeqCst);
            }
            (DynConfigValueShared::U64(shared), DynConfigValue::U64(val)) => {
                shared.store(val, Ordering::SeqCst);
            }
            (shared, val) => unreachable!("tried to update shared {shared:?} with {val:?}"),
        }
    }

    fn update_parse(&self, value: &str) -> Result<(), anyhow::Error> {
        match self {
            DynConfigValueShared::Bool(shared) => {
                let val: bool = value.parse()?;
                shared.store(val, Ordering::SeqCst);
            }
            DynConfigValueShared::U64(shared) => {
                let val: u64 = value.parse()?;
                shared.store(val, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}

impl fmt::Display for DynConfigValueShared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynConfigValueShared::Bool(val) => write!(f, "{}", val.load(Ordering::SeqCst)),
            DynConfigValueShared::U64(val) => write!(f, "{}", val.load(Ordering::SeqCst)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    pub static TEST_CONFIG_A: Config<bool> =
        Config::new("test_config_a", "A test configuration value.", true);
    pub static TEST_CONFIG_B: Config<u64> =
        Config::new("test_config_b", "A test configuration value.", 4096);

    fn test_set() -> ConfigSet {
        let mut config_set = ConfigSet::builder();
        config_set.register(&TEST_CONFIG_A).register(&TEST_CONFIG_B);
        config_set.build()
    }

    #[test]
    fn smoketest_read() {
        let config_set = test_set();
        assert_eq!(TEST_CONFIG_A.read(&config_set), true);
        assert_eq!(TEST_CONFIG_B.read(&config_set), 4096);
    }

    #[test]
    fn smoketest_update() {
        let config_set = test_set();
        let config_set_2 = config_set.clone();

        config_set.update(&TEST_CONFIG_A, false);
        assert_eq!(TEST_CONFIG_A.read(&config_set), false);
        assert_eq!(TEST_CONFIG_A.read(&config_set_2), false);

        config_set.update(&TEST_CONFIG_B, 512);
        assert_eq!(TEST_CONFIG_B.read(&config_set_2), 512);
    }

    #[test]
    fn smoketest_parse() {
        let config_set = test_set();

        config_set.try_update("test_config_a", "false").unwrap();
        assert_eq!(TEST_CONFIG_A.read(&config_set), false);

        config_set.try_update("test_config_b", "65536").unwrap();
        assert_eq!(TEST_CONFIG_B.read(&config_set), 65536);

        assert!(config_set.try_update("test_config_b", "lots").is_err());
        assert!(config_set.try_update("not_a_config", "1").is_err());
        assert_eq!(TEST_CONFIG_B.read(&config_set), 65536);
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(env_var_name("copy_block_size"), "SYSUTIL_COPY_BLOCK_SIZE");
    }
}
