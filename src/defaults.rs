//! Default values for epicsenv environments.
//!
//! The starter set mirrors a typical synApps deployment: EPICS base, the core
//! support modules and the areaDetector foundation, together with the build
//! switches those modules expect in `CONFIG_SITE`.

use std::path::PathBuf;

use crate::config::Configuration;
use crate::error::Result;
use crate::module::ModuleRecord;

/// Environment variable overriding [`default_config_dir`].
pub const CONFIG_DIR_ENV: &str = "EPICSENV_CONFIG_DIR";

/// Build macros written to every generated `CONFIG_SITE`.
pub const DEFAULT_MACROS: &[(&str, &str)] = &[
    ("TIRPC", "YES"),
    ("STATIC_BUILD", "YES"),
    ("BUILD_IOCS", "YES"),
    ("WITH_BOOST", "NO"),
    ("BOOST_EXTERNAL", "YES"),
    ("WITH_PVA", "YES"),
    ("WITH_QSRV", "YES"),
    ("WITH_BLOSC", "YES"),
    ("BLOSC_EXTERNAL", "NO"),
    ("WITH_BITSHUFFLE", "YES"),
    ("BITSHUFFLE_EXTERNAL", "NO"),
    ("WITH_GRAPHICSMAGICK", "YES"),
    ("GRAPHICSMAGICK_EXTERNAL", "NO"),
    ("GRAPHICSMAGICK_PREFIX_SYMBOLS", "YES"),
    ("WITH_HDF5", "YES"),
    ("HDF5_EXTERNAL", "NO"),
    ("WITH_JSON", "YES"),
    ("WITH_JPEG", "YES"),
    ("JPEG_EXTERNAL", "NO"),
    ("WITH_NETCDF", "YES"),
    ("NETCDF_EXTERNAL", "NO"),
    ("WITH_NEXUS", "YES"),
    ("NEXUS_EXTERNAL", "NO"),
    ("WITH_OPENCV", "NO"),
    ("OPENCV_EXTERNAL", "YES"),
    ("WITH_OPENCV_VIDEO", "YES"),
    ("WITH_SZIP", "YES"),
    ("SZIP_EXTERNAL", "NO"),
    ("WITH_TIFF", "YES"),
    ("TIFF_EXTERNAL", "NO"),
    ("XML2_EXTERNAL", "NO"),
    ("WITH_ZLIB", "YES"),
    ("ZLIB_EXTERNAL", "NO"),
    ("ARAVIS_LIB", "/opt/aravis/lib64"),
    ("ARAVIS_INCLUDE", "/opt/aravis/include/aravis-0.8"),
    ("GLIB_INCLUDE", "/usr/include/glib-2.0 /usr/lib64/glib-2.0/include"),
    ("glib-2.0_DIR", "/usr/lib64"),
];

/// One entry of the starter module set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultModule {
    pub name: &'static str,
    pub url: &'static str,
    pub version: &'static str,
    pub recursive: bool,
}

const fn module(name: &'static str, url: &'static str, version: &'static str) -> DefaultModule {
    DefaultModule {
        name,
        url,
        version,
        recursive: false,
    }
}

const fn recursive(name: &'static str, url: &'static str, version: &'static str) -> DefaultModule {
    DefaultModule {
        name,
        url,
        version,
        recursive: true,
    }
}

/// Starter modules, in the order they are declared in a new environment.
pub const DEFAULT_MODULES: &[DefaultModule] = &[
    recursive("EPICS_BASE", "https://github.com/epics-base/epics-base", "R7.0.5"),
    module("IPAC", "https://github.com/epics-modules/ipac", "2.16"),
    module("ASYN", "https://github.com/epics-modules/asyn", "R4-41"),
    module("AUTOSAVE", "https://github.com/epics-modules/autosave", "R5-10-2"),
    module("BUSY", "https://github.com/epics-modules/busy", "R1-7-3"),
    module("CALC", "https://github.com/epics-modules/calc", "R3-7-3"),
    module("DEVIOCSTATS", "https://github.com/epics-modules/iocStats", "3.2.0"),
    module("SSCAN", "https://github.com/epics-modules/sscan", "R2-11-3"),
    recursive("MOTOR", "https://github.com/epics-modules/motor", "R7-2-2"),
    module("SNCSEQ", "https://github.com/mdavidsaver/sequencer-mirror", "R2-2-9"),
    module("OPTICS", "https://github.com/epics-modules/optics", "R2-13-5"),
    module("STREAM", "https://github.com/paulscherrerinstitute/StreamDevice", "2.8.10"),
    module("RECCASTER", "https://github.com/ChannelFinder/recsync", "1.6"),
    module("STD", "https://github.com/epics-modules/std", "R3-6-2"),
    module("ADSUPPORT", "https://github.com/areaDetector/ADSupport", "R1-10"),
    module("ADCORE", "https://github.com/areaDetector/ADCore", "R3-12-1"),
];

impl DefaultModule {
    pub fn to_record(self) -> ModuleRecord {
        ModuleRecord::new(self.name, self.url, self.version).with_recursive(self.recursive)
    }
}

impl Configuration {
    /// A new environment pre-populated with [`DEFAULT_MACROS`] and
    /// [`DEFAULT_MODULES`].
    pub fn with_defaults(build_location: impl Into<PathBuf>, install_location: impl Into<PathBuf>) -> Result<Self> {
        let mut config = Self::new(build_location, install_location);
        for (name, value) in DEFAULT_MACROS {
            config.set_macro(*name, *value);
        }
        for module in DEFAULT_MODULES {
            config.add_module(module.to_record())?;
        }
        Ok(config)
    }
}

/// Returns the directory holding named environments and `epicsenv.ini`.
///
/// `$EPICSENV_CONFIG_DIR` when set, otherwise the platform config directory:
/// - Linux: `~/.config/epicsenv`
/// - macOS: `~/Library/Application Support/epicsenv`
/// - Windows: `{FOLDERID_RoamingAppData}\epicsenv`
///
/// Falls back to `.epicsenv` in the current directory if the platform config
/// directory cannot be determined.
pub fn default_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::config_dir()
        .map(|dir| dir.join("epicsenv"))
        .unwrap_or_else(|| PathBuf::from(".epicsenv"))
}
