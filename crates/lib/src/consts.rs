//! Names and defaults shared across the crate.

/// Repository document looked up inside `<repo>.src/` or a data-root repo dir.
pub const REPO_DOCUMENT: &str = "_repo.yaml";

/// Build file committed inside a package's source tree.
pub const SOURCE_BUILD_FILE: &str = ".fpmbuild.yaml";

pub const SOURCE_DIR_SUFFIX: &str = "src";
pub const STAMP_SUFFIX: &str = "ok";
pub const STAGING_SUFFIX: &str = "new";

/// `YYYYMMDD-HHMMSS`, sorts lexicographically in chronological order.
pub const GENERATION_TIME_FORMAT: &str = "%Y%m%d-%H%M%S";

pub const DEFAULT_IMAGE: &str = "debian:stable";
pub const DEFAULT_CONTAINER_SRC_PATH: &str = "/src";
pub const IMAGE_TAG_PREFIX: &str = "fpmbuild";
pub const CONTAINER_RUNTIME: &str = "docker";

pub const DEFAULT_PACKAGING_TOOL: &str = "fpm";
pub const DEFAULT_METADATA_TOOL_PREFIX: &str = "fprepo-";
pub const DEFAULT_PRUNE_TOOL: &str = "fpprunerepo";

pub const ENV_PACKAGING_TOOL: &str = "FPMBOT_FPM";
pub const ENV_METADATA_TOOL_PREFIX: &str = "FPMBOT_FPREPO_PREFIX";
/// Empty value disables pruning.
pub const ENV_PRUNE_TOOL: &str = "FPMBOT_PRUNE";

pub const API_KEY_HEADER: &str = "APIKey";
pub const EXIT_STATUS_HEADER: &str = "ExitStatus";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:9158";
pub const DEFAULT_FORMAT: &str = "deb";
