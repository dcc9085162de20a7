/// Kernel name used when the settings do not give one
pub const DEFAULT_KERNEL_NAME: &str = "tessera";

/// Attribute that receives a configuration member's base directory
pub const CONFIGURATION_BASE_DIR: &str = "configurationBaseDir";

/// Interface tag carried by every configuration component
pub const CONFIGURATION_INTERFACE: &str = "Configuration";

/// Type name of the component a configuration registers for itself
pub const CONFIGURATION_TYPE: &str = "tessera.Configuration";

/// Settings file looked up when none is given on the command line
pub const DEFAULT_SETTINGS_FILE: &str = "tessera.toml";
