//! Single interface for registering all of the [`Config`]s used by the tools.

use sysutil_cfg::{Config, ConfigSet, ConfigSetBuilder};

pub static COLOR: Config<bool> = Config::new(
    "color",
    "Whether the self-test report is colored, always off when NO_COLOR is set.",
    true,
);

pub fn all_cfgs(builder: &mut ConfigSetBuilder) {
    sysutil_filesystem::cfgs::register_configs(builder);
    builder.register(&COLOR);
}

/// [`ConfigSet`] with every config at its default value.
pub fn defaults() -> ConfigSet {
    let mut builder = ConfigSet::builder();
    all_cfgs(&mut builder);
    builder.build()
}

/// [`ConfigSet`] with overrides from the environment applied.
pub fn load() -> ConfigSet {
    let configs = defaults();
    configs.load_env();
    if sysutil_ore::env::is_truthy("NO_COLOR") {
        configs.update(&COLOR, false);
    }
    tracing::debug!("loaded configs:\n{configs}");
    configs
}
