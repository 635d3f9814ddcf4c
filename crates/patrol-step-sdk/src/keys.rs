//! Names shared with the CI environment: input variables read by the step and
//! output keys published for downstream steps.

/// Optional pinned Patrol CLI version; the latest is installed when empty.
pub const CUSTOM_PATROL_CLI_VERSION: &str = "CUSTOM_PATROL_CLI_VERSION";
/// Required. Test target file(s) passed to `patrol build --target`.
pub const TEST_TARGET_DIRECTORY: &str = "TEST_TARGET_DIRECTORY";
/// Required. `android`, `ios` or `both`.
pub const PLATFORM: &str = "PLATFORM";
/// Required. `release`, `debug` or `simulator`.
pub const TEST_BUILD_TYPE: &str = "TEST_BUILD_TYPE";
pub const TAGS: &str = "TAGS";
pub const EXCLUDED_TAGS: &str = "EXCLUDED_TAGS";
pub const IS_VERBOSE_MODE: &str = "IS_VERBOSE_MODE";
pub const IS_COVERAGE_MODE: &str = "IS_COVERAGE_MODE";

/// Logical field names of the build parameter mapping.
pub mod fields {
    pub const PLATFORM: &str = "platform";
    pub const TARGET: &str = "target";
    pub const BUILD_TYPE: &str = "buildType";
    pub const TAGS: &str = "tags";
    pub const EXCLUDED_TAGS: &str = "excludedTags";
    pub const VERBOSE: &str = "verbose";
    pub const COVERAGE: &str = "coverage";

    pub const REQUIRED: [&str; 3] = [PLATFORM, TARGET, BUILD_TYPE];
}

/// Pairs of (logical field, environment variable).
pub const FIELD_ENV_VARS: [(&str, &str); 7] = [
    (fields::PLATFORM, PLATFORM),
    (fields::TARGET, TEST_TARGET_DIRECTORY),
    (fields::BUILD_TYPE, TEST_BUILD_TYPE),
    (fields::TAGS, TAGS),
    (fields::EXCLUDED_TAGS, EXCLUDED_TAGS),
    (fields::VERBOSE, IS_VERBOSE_MODE),
    (fields::COVERAGE, IS_COVERAGE_MODE),
];

/// Export keys read by later pipeline steps.
pub mod exports {
    pub const ANDROID_INSTRUMENTATION_APK_PATH: &str = "ANDROID_INSTRUMENTATION_APK_PATH";
    pub const ANDROID_APK_PATH: &str = "ANDROID_APK_PATH";
    pub const IOS_APP_UNDER_TEST: &str = "IOS_APP_UNDER_TEST";
    pub const IOS_TEST_INSTRUMENTATION_APP: &str = "IOS_TEST_INSTRUMENTATION_APP";
    pub const IOS_RUNNER_FILE: &str = "IOS_RUNNER_FILE";
    pub const IOS_BUILD_EXPORTS: &str = "IOS_BUILD_EXPORTS";
}
