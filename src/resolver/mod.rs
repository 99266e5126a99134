//! Configuration resolution.
//!
//! Builds one [`Configuration`] from, in order of precedence: explicit
//! input, the cache of a previous configuration, interactive prompts and
//! auto-detected defaults. Fields are resolved one at a time in a fixed
//! order and each is validated as soon as it is set, so later fields can
//! depend on earlier ones (the build system depends on the compiler).

pub mod errors;

use std::collections::BTreeMap;
use std::path::Path;

use crate::core::cache::CachedConfig;
use crate::core::configuration::{
    validate, validate_compiler, validate_dependency_manager, validate_generator, Availability,
    BackendKind, BuildType, CompilerId, Configuration, Field, Generator, GeneratorRequest, ModuleFlags, ValidationError,
    VsVersion,
};
use crate::core::platform::Platform;
use crate::env::EnvironmentContext;
use crate::toolchain::{catalog, Archivers, Role, ToolchainCandidate, ToolchainDetector};
use crate::util::prompt::Prompter;

pub use errors::ConfigureError;

/// Configuration values given explicitly on the command line.
///
/// `None` means "not specified", never "off".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigRequest {
    pub platform: Option<Platform>,
    pub build_type: Option<BuildType>,
    pub compiler: Option<CompilerId>,
    pub generator: Option<GeneratorRequest>,
    pub core_only: Option<bool>,
    pub build_tests: Option<bool>,
    pub build_examples: Option<bool>,
    pub dependency_manager: Option<bool>,
}

impl ConfigRequest {
    /// Whether any configuration field was given.
    pub fn has_explicit_config(&self) -> bool {
        self.platform.is_some()
            || self.build_type.is_some()
            || self.compiler.is_some()
            || self.generator.is_some()
            || self.core_only.is_some()
            || self.build_tests.is_some()
            || self.build_examples.is_some()
            || self.dependency_manager.is_some()
    }
}

/// A resolved configuration and the tools that implement it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub config: Configuration,
    pub compiler: ToolchainCandidate,
    pub backend: ToolchainCandidate,
    pub dependency_manager: Option<ToolchainCandidate>,
    pub archivers: Archivers,
    /// A vendor environment must be imported before configuring.
    pub needs_bootstrap: bool,
    /// Non-fatal problems found while resolving.
    pub warnings: Vec<String>,
}

impl Resolution {
    /// Cache variables passed to the build backend on configure.
    pub fn cache_variables(&self, prefix: &str, toolchain_file: Option<&Path>) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        let on_off = |value: bool| if value { "ON" } else { "OFF" }.to_string();
        let generator = self.config.generator;

        if !generator.is_multi_config() {
            vars.insert("CMAKE_BUILD_TYPE".to_string(), self.config.build_type.as_str().to_string());
        }

        // Visual Studio picks its own compiler, and cl is found through the
        // imported environment
        if !generator.is_visual_studio() && self.config.compiler != CompilerId::MSVC {
            let (cc, cxx) = self.config.compiler.drivers();
            vars.insert(
                "CMAKE_C_COMPILER".to_string(),
                self.compiler.companion(cc).display().to_string(),
            );
            vars.insert(
                "CMAKE_CXX_COMPILER".to_string(),
                self.compiler.companion(cxx).display().to_string(),
            );
        }

        if let Some(ar) = &self.archivers.ar {
            vars.insert("CMAKE_AR".to_string(), ar.display().to_string());
        }
        if let Some(ranlib) = &self.archivers.ranlib {
            vars.insert("CMAKE_RANLIB".to_string(), ranlib.display().to_string());
        }

        if !generator.is_visual_studio() && !self.backend.on_path {
            vars.insert(
                "CMAKE_MAKE_PROGRAM".to_string(),
                self.backend.executable.display().to_string(),
            );
        }

        vars.insert("CMAKE_EXPORT_COMPILE_COMMANDS".to_string(), "ON".to_string());

        let modules = self.config.modules;
        vars.insert(format!("{}_BUILD_CORE_ONLY", prefix), on_off(modules.core_only));
        vars.insert(format!("{}_BUILD_TESTS", prefix), on_off(modules.build_tests));
        vars.insert(format!("{}_BUILD_EXAMPLES", prefix), on_off(modules.build_examples));
        vars.insert(format!("{}_USE_CONAN", prefix), on_off(self.config.dependency_manager));
        vars.insert(format!("{}_FORCE_CONAN", prefix), on_off(self.config.dependency_manager));

        if let Some(toolchain_file) = toolchain_file {
            vars.insert(
                "CMAKE_TOOLCHAIN_FILE".to_string(),
                toolchain_file.display().to_string(),
            );
        }

        vars
    }
}

/// Resolves configurations against what is installed on the host.
pub struct ConfigurationResolver<'a> {
    detector: &'a ToolchainDetector<'a>,
    prompter: &'a dyn Prompter,
    env: &'a EnvironmentContext,
    option_prefix: String,
}

impl<'a> ConfigurationResolver<'a> {
    pub fn new(
        detector: &'a ToolchainDetector<'a>,
        prompter: &'a dyn Prompter,
        env: &'a EnvironmentContext,
        option_prefix: impl Into<String>,
    ) -> Self {
        ConfigurationResolver {
            detector,
            prompter,
            env,
            option_prefix: option_prefix.into(),
        }
    }

    /// Resolve every field of a configuration.
    pub fn resolve(
        &self,
        request: &ConfigRequest,
        cached: Option<&CachedConfig>,
    ) -> Result<Resolution, ConfigureError> {
        let platform = request.platform.unwrap_or(self.env.platform());
        let env = if self.env.platform() == platform {
            self.env.clone()
        } else {
            self.env.for_platform(platform)
        };
        let mut warnings = Vec::new();
        let prefix = self.option_prefix.as_str();

        let core_only = self.resolve_core_only(request, cached)?;
        let build_tests = self.resolve_flag(
            Field::Tests,
            request.build_tests,
            cached.and_then(|c| c.flag(&format!("{}_BUILD_TESTS", prefix))),
            "Do you want to build tests?",
        )?;
        let build_examples = self.resolve_flag(
            Field::Examples,
            request.build_examples,
            cached.and_then(|c| c.flag(&format!("{}_BUILD_EXAMPLES", prefix))),
            "Do you want to build examples?",
        )?;
        let build_type = self.resolve_build_type(request, cached)?;

        let compilers = self.detect(Role::Compiler, platform, &env)?;
        let compiler = self.resolve_compiler(request, cached, platform, &compilers, &mut warnings)?;
        let compiler_candidate = validate_compiler(compiler, platform, &compilers)
            .map_err(|e| ConfigureError::invalid(e, Vec::new()))?
            .clone();
        if compiler_candidate.version.is_none() {
            let message = format!(
                "Could not determine the version of {}; assuming it supports C++23",
                compiler
            );
            tracing::warn!("{}", message);
            warnings.push(message);
        }

        let backends = self.detect(Role::Backend, platform, &env)?;
        let generator = self.resolve_generator(request, cached, compiler, platform, &backends, &mut warnings)?;
        let backend = validate_generator(generator, compiler, platform, &backends)
            .map_err(|e| ConfigureError::invalid(e, Vec::new()))?
            .clone();

        let managers = self.detector.detect(Role::DependencyManager, platform, &env);
        let dependency_manager = self.resolve_dependency_manager(request, cached, &managers, &mut warnings)?;
        let manager_candidate = validate_dependency_manager(dependency_manager, &managers)
            .map_err(|e| ConfigureError::invalid(e, Vec::new()))?
            .cloned();

        let archivers = self.detector.probe_archivers(&compiler_candidate, platform, &env);
        let needs_bootstrap = compiler_candidate.requires_bootstrap && !generator.is_visual_studio();

        let config = Configuration {
            platform,
            build_type,
            compiler,
            generator,
            modules: ModuleFlags {
                core_only,
                build_tests,
                build_examples,
            },
            dependency_manager,
        };
        let availability = Availability {
            compilers: &compilers,
            backends: &backends,
            dependency_managers: &managers,
        };
        validate(&config, &availability).map_err(|e| ConfigureError::invalid(e, Vec::new()))?;
        tracing::debug!("Resolved configuration: {:?}", config);

        Ok(Resolution {
            config,
            compiler: compiler_candidate,
            backend,
            dependency_manager: manager_candidate,
            archivers,
            needs_bootstrap,
            warnings,
        })
    }

    fn detect(
        &self,
        role: Role,
        platform: Platform,
        env: &EnvironmentContext,
    ) -> Result<Vec<ToolchainCandidate>, ConfigureError> {
        let found = self.detector.detect(role, platform, env);
        if found.is_empty() {
            let searched = catalog(role, platform)
                .iter()
                .flat_map(|spec| spec.executables.iter().map(|e| e.to_string()))
                .collect();
            return Err(ConfigureError::Detection {
                role,
                platform,
                searched,
            });
        }
        Ok(found)
    }

    fn resolve_core_only(&self, request: &ConfigRequest, cached: Option<&CachedConfig>) -> Result<bool, ConfigureError> {
        if let Some(value) = request.core_only {
            return Ok(value);
        }
        let key = format!("{}_BUILD_CORE_ONLY", self.option_prefix);
        if let Some(value) = cached.and_then(|c| c.flag(&key)) {
            return Ok(value);
        }
        if !self.prompter.is_interactive() {
            return Ok(false);
        }

        let items = vec!["Core + all modules".to_string(), "Core only".to_string()];
        match self.prompter.select("Build configuration", &items, 0)? {
            Some(choice) => Ok(choice == 1),
            None => Err(ConfigureError::Cancelled),
        }
    }

    fn resolve_flag(
        &self,
        field: Field,
        explicit: Option<bool>,
        cached: Option<bool>,
        question: &str,
    ) -> Result<bool, ConfigureError> {
        if let Some(value) = explicit.or(cached) {
            return Ok(value);
        }
        if !self.prompter.is_interactive() {
            return Ok(false);
        }
        tracing::debug!("Prompting for {}", field);
        self.prompter.confirm(question, false)?.ok_or(ConfigureError::Cancelled)
    }

    fn resolve_build_type(
        &self,
        request: &ConfigRequest,
        cached: Option<&CachedConfig>,
    ) -> Result<BuildType, ConfigureError> {
        if let Some(build_type) = request.build_type.or_else(|| cached.and_then(CachedConfig::build_type)) {
            return Ok(build_type);
        }
        if !self.prompter.is_interactive() {
            return Ok(BuildType::default());
        }

        let items: Vec<String> = BuildType::ALL.iter().map(|t| t.to_string()).collect();
        let default = BuildType::ALL
            .iter()
            .position(|t| *t == BuildType::default())
            .unwrap_or(0);
        match self.prompter.select("Build type", &items, default)? {
            Some(choice) => Ok(BuildType::ALL[choice]),
            None => Err(ConfigureError::Cancelled),
        }
    }

    fn resolve_compiler(
        &self,
        request: &ConfigRequest,
        cached: Option<&CachedConfig>,
        platform: Platform,
        compilers: &[ToolchainCandidate],
        warnings: &mut Vec<String>,
    ) -> Result<CompilerId, ConfigureError> {
        let check = |id: &CompilerId| validate_compiler(*id, platform, compilers).map(|_| ());
        let options: Vec<(String, CompilerId)> = compilers
            .iter()
            .filter_map(|c| c.compiler_id().map(|id| (c.describe(), id)))
            .collect();
        let alternatives = valid_names(&options, &check, |id| id.name().to_string());

        if let Some(compiler) = request.compiler {
            check(&compiler).map_err(|e| ConfigureError::invalid(e, alternatives))?;
            return Ok(compiler);
        }

        if let Some(compiler) = cached.and_then(CachedConfig::compiler) {
            match check(&compiler) {
                Ok(()) => return Ok(compiler),
                Err(e) => discard_cached(e, warnings),
            }
        }

        self.choose(Field::Compiler, "Select compiler", &options, &check)
    }

    fn resolve_generator(
        &self,
        request: &ConfigRequest,
        cached: Option<&CachedConfig>,
        compiler: CompilerId,
        platform: Platform,
        backends: &[ToolchainCandidate],
        warnings: &mut Vec<String>,
    ) -> Result<Generator, ConfigureError> {
        let check = |generator: &Generator| {
            validate_generator(*generator, compiler, platform, backends).map(|_| ())
        };
        let options: Vec<(String, Generator)> = backends
            .iter()
            .filter_map(|b| b.generator().map(|g| (b.describe(), g)))
            .collect();
        let alternatives = valid_names(&options, &check, |g| g.cmake_name());

        if let Some(requested) = &request.generator {
            let generator = concrete_generator(requested, backends);
            check(&generator).map_err(|e| ConfigureError::invalid(e, alternatives))?;
            return Ok(generator);
        }

        if let Some(requested) = cached.and_then(CachedConfig::generator) {
            let generator = concrete_generator(&requested, backends);
            match check(&generator) {
                Ok(()) => return Ok(generator),
                Err(e) => discard_cached(e, warnings),
            }
        }

        self.choose(Field::Generator, "Select build system", &options, &check)
    }

    fn resolve_dependency_manager(
        &self,
        request: &ConfigRequest,
        cached: Option<&CachedConfig>,
        managers: &[ToolchainCandidate],
        warnings: &mut Vec<String>,
    ) -> Result<bool, ConfigureError> {
        if let Some(enabled) = request.dependency_manager {
            validate_dependency_manager(enabled, managers)
                .map_err(|e| ConfigureError::invalid(e, vec!["--no-conan".to_string()]))?;
            return Ok(enabled);
        }

        if let Some(enabled) = cached.and_then(|c| c.dependency_manager(&self.option_prefix)) {
            match validate_dependency_manager(enabled, managers) {
                Ok(_) => return Ok(enabled),
                Err(e) => discard_cached(e, warnings),
            }
        }

        // Without Conan the only valid choice is "no"
        if managers.is_empty() || !self.prompter.is_interactive() {
            return Ok(false);
        }
        self.prompter
            .confirm("Use Conan to install dependencies?", true)?
            .ok_or(ConfigureError::Cancelled)
    }

    /// Prompt for, or default, one of `options`.
    ///
    /// Only valid options count towards the default, and a single valid
    /// option is taken without asking. An invalid interactive choice is
    /// reported and asked again.
    fn choose<T: Copy>(
        &self,
        field: Field,
        prompt: &str,
        options: &[(String, T)],
        check: &dyn Fn(&T) -> Result<(), ValidationError>,
    ) -> Result<T, ConfigureError> {
        let mut first_error = None;
        let mut valid = Vec::new();
        for (index, (_, value)) in options.iter().enumerate() {
            match check(value) {
                Ok(()) => valid.push(index),
                Err(e) => {
                    tracing::debug!("Skipping {}: {}", options[index].0, e.reason);
                    first_error.get_or_insert(e);
                }
            }
        }

        let Some(&default) = valid.first() else {
            let err = first_error.unwrap_or_else(|| {
                ValidationError::new(field, "none", format!("no {} was detected", field))
            });
            return Err(ConfigureError::invalid(err, Vec::new()));
        };

        if valid.len() == 1 || !self.prompter.is_interactive() {
            return Ok(options[default].1);
        }

        let labels: Vec<String> = options.iter().map(|(label, _)| label.clone()).collect();
        loop {
            let Some(choice) = self.prompter.select(prompt, &labels, default)? else {
                return Err(ConfigureError::Cancelled);
            };
            let value = options[choice].1;
            match check(&value) {
                Ok(()) => return Ok(value),
                Err(e) => tracing::warn!("{}", e),
            }
        }
    }
}

/// The concrete generator a request refers to, preferring detected ones.
fn concrete_generator(request: &GeneratorRequest, backends: &[ToolchainCandidate]) -> Generator {
    backends
        .iter()
        .filter_map(ToolchainCandidate::generator)
        .find(|g| request.matches(g))
        .unwrap_or(match request.kind {
            BackendKind::Ninja => Generator::Ninja,
            BackendKind::Make => Generator::UnixMakefiles,
            BackendKind::MsBuild => Generator::VisualStudio(request.version.unwrap_or(VsVersion::Vs2022)),
        })
}

fn valid_names<T>(
    options: &[(String, T)],
    check: &dyn Fn(&T) -> Result<(), ValidationError>,
    name: impl Fn(&T) -> String,
) -> Vec<String> {
    let mut names: Vec<String> = options
        .iter()
        .filter(|(_, value)| check(value).is_ok())
        .map(|(_, value)| name(value))
        .collect();
    names.dedup();
    names
}

fn discard_cached(err: ValidationError, warnings: &mut Vec<String>) {
    let message = format!(
        "Ignoring cached {} `{}`: {}",
        err.field, err.rejected, err.reason
    );
    tracing::warn!("{}", message);
    warnings.push(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        cache_text, linux_env, linux_host, windows_env, windows_host, Answer, MockHost,
        MockProcessOutput, ScriptedPrompter,
    };
    use crate::util::prompt::NonInteractivePrompter;

    fn resolve_with(
        host: &MockHost,
        prompter: &dyn Prompter,
        env: &EnvironmentContext,
        request: &ConfigRequest,
        cached: Option<&CachedConfig>,
    ) -> Result<Resolution, ConfigureError> {
        let detector = ToolchainDetector::new(host);
        ConfigurationResolver::new(&detector, prompter, env, "HELIOS").resolve(request, cached)
    }

    fn linux_request() -> ConfigRequest {
        ConfigRequest {
            platform: Some(Platform::Linux),
            ..ConfigRequest::default()
        }
    }

    #[test]
    fn test_non_interactive_defaults() {
        let host = linux_host();
        let resolution = resolve_with(&host, &NonInteractivePrompter, &linux_env(), &linux_request(), None).unwrap();

        let config = &resolution.config;
        assert_eq!(config.build_type, BuildType::Release);
        assert_eq!(config.compiler, CompilerId::GCC);
        assert_eq!(config.generator, Generator::Ninja);
        assert_eq!(config.modules, ModuleFlags::default());
        assert!(!config.dependency_manager);
        assert!(!resolution.needs_bootstrap);
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_explicit_values_win_over_cache_and_prompts() {
        let host = linux_host();
        let cached = CachedConfig::parse(&cache_text(&[
            ("CMAKE_BUILD_TYPE", "Release"),
            ("CMAKE_CXX_COMPILER", "/usr/bin/g++"),
            ("CMAKE_GENERATOR", "Ninja"),
        ]));
        let request = ConfigRequest {
            build_type: Some(BuildType::Debug),
            compiler: Some(CompilerId::CLANG),
            generator: Some("make".parse().unwrap()),
            core_only: Some(true),
            build_tests: Some(true),
            build_examples: Some(false),
            dependency_manager: Some(false),
            ..linux_request()
        };
        let prompter = ScriptedPrompter::new([]);

        let resolution = resolve_with(&host, &prompter, &linux_env(), &request, Some(&cached)).unwrap();
        assert_eq!(resolution.config.build_type, BuildType::Debug);
        assert_eq!(resolution.config.compiler, CompilerId::CLANG);
        assert_eq!(resolution.config.generator, Generator::UnixMakefiles);
        assert!(resolution.config.modules.core_only);
        assert!(prompter.prompts().is_empty());
    }

    #[test]
    fn test_cached_values_fill_unspecified_fields() {
        let host = linux_host();
        let cached = CachedConfig::parse(&cache_text(&[
            ("CMAKE_BUILD_TYPE", "RelWithDebInfo"),
            ("CMAKE_CXX_COMPILER", "/usr/bin/clang++"),
            ("CMAKE_GENERATOR", "Unix Makefiles"),
            ("HELIOS_BUILD_CORE_ONLY", "OFF"),
            ("HELIOS_BUILD_TESTS", "ON"),
            ("HELIOS_BUILD_EXAMPLES", "OFF"),
            ("HELIOS_USE_CONAN", "OFF"),
        ]));
        let request = ConfigRequest {
            build_type: Some(BuildType::Debug),
            ..linux_request()
        };
        let prompter = ScriptedPrompter::new([]);

        let resolution = resolve_with(&host, &prompter, &linux_env(), &request, Some(&cached)).unwrap();
        assert_eq!(resolution.config.build_type, BuildType::Debug);
        assert_eq!(resolution.config.compiler, CompilerId::CLANG);
        assert_eq!(resolution.config.generator, Generator::UnixMakefiles);
        assert!(resolution.config.modules.build_tests);
        assert!(prompter.prompts().is_empty());
    }

    #[test]
    fn test_stale_cached_compiler_falls_back_with_warning() {
        let mut host = MockHost::new();
        host.add_file("/usr/bin/gcc");
        host.add_file("/usr/bin/g++");
        host.add_file("/usr/bin/ninja");
        host.expect_contains("gcc --version", MockProcessOutput::success("gcc (GCC) 13.2.0"));
        let cached = CachedConfig::parse(&cache_text(&[("CMAKE_CXX_COMPILER", "/opt/llvm/bin/clang++")]));

        let resolution = resolve_with(&host, &NonInteractivePrompter, &linux_env(), &linux_request(), Some(&cached)).unwrap();
        assert_eq!(resolution.config.compiler, CompilerId::GCC);
        assert_eq!(resolution.warnings.len(), 1);
        assert!(resolution.warnings[0].contains("Ignoring cached compiler `clang`"));
    }

    #[test]
    fn test_explicit_missing_compiler_is_validation_failure() {
        let host = linux_host();
        let request = ConfigRequest {
            build_type: Some(BuildType::Debug),
            compiler: Some(CompilerId::MSVC),
            ..linux_request()
        };

        let err = resolve_with(&host, &NonInteractivePrompter, &linux_env(), &request, None).unwrap_err();
        match err {
            ConfigureError::Validation {
                field,
                rejected,
                alternatives,
                ..
            } => {
                assert_eq!(field, Field::Compiler);
                assert_eq!(rejected, "msvc");
                assert_eq!(alternatives, vec!["gcc", "clang"]);
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_no_compiler_at_all_is_detection_failure() {
        let mut host = MockHost::new();
        host.add_file("/usr/bin/ninja");

        let err = resolve_with(&host, &NonInteractivePrompter, &linux_env(), &linux_request(), None).unwrap_err();
        assert!(matches!(
            err,
            ConfigureError::Detection {
                role: Role::Compiler,
                ..
            }
        ));
    }

    #[test]
    fn test_old_compiler_is_skipped_by_default() {
        let mut host = MockHost::new();
        for tool in ["gcc", "g++", "clang", "clang++", "ninja"] {
            host.add_file(format!("/usr/bin/{}", tool));
        }
        host.expect_contains("gcc --version", MockProcessOutput::success("gcc (GCC) 11.4.0"));
        host.expect_contains("clang --version", MockProcessOutput::success("clang version 17.0.6"));

        let resolution = resolve_with(&host, &NonInteractivePrompter, &linux_env(), &linux_request(), None).unwrap();
        assert_eq!(resolution.config.compiler, CompilerId::CLANG);
    }

    #[test]
    fn test_interactive_prompts_in_field_order() {
        let host = linux_host();
        let prompter = ScriptedPrompter::new([
            Answer::Select(1),         // core only
            Answer::Confirm(true),     // tests
            Answer::Confirm(false),    // examples
            Answer::SelectLabel("Debug"),
            Answer::SelectLabel("clang"),
            Answer::Default,           // build system
        ]);

        let resolution = resolve_with(&host, &prompter, &linux_env(), &linux_request(), None).unwrap();
        assert!(resolution.config.modules.core_only);
        assert!(resolution.config.modules.build_tests);
        assert_eq!(resolution.config.build_type, BuildType::Debug);
        assert_eq!(resolution.config.compiler, CompilerId::CLANG);
        assert_eq!(resolution.config.generator, Generator::Ninja);
        assert_eq!(
            prompter.prompts(),
            vec![
                "Build configuration",
                "Do you want to build tests?",
                "Do you want to build examples?",
                "Build type",
                "Select compiler",
                "Select build system",
            ]
        );
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn test_single_valid_choice_is_not_prompted() {
        let mut host = MockHost::new();
        for tool in ["gcc", "g++", "clang", "clang++", "ninja"] {
            host.add_file(format!("/usr/bin/{}", tool));
        }
        host.expect_contains("gcc --version", MockProcessOutput::success("gcc (GCC) 12.1.0"));
        host.expect_contains("clang --version", MockProcessOutput::success("clang version 18.1.0"));
        let request = ConfigRequest {
            build_type: Some(BuildType::Release),
            core_only: Some(false),
            build_tests: Some(false),
            build_examples: Some(false),
            ..linux_request()
        };

        let prompter = ScriptedPrompter::new([]);
        let resolution = resolve_with(&host, &prompter, &linux_env(), &request, None).unwrap();
        assert_eq!(resolution.config.compiler, CompilerId::CLANG);
        assert_eq!(resolution.config.generator, Generator::Ninja);
        assert!(prompter.prompts().is_empty());
    }

    #[test]
    fn test_interactive_invalid_choice_is_asked_again() {
        let mut host = windows_host();
        host.add_file("C:/Program Files/LLVM/bin/clang.exe");
        host.add_file("C:/Program Files/LLVM/bin/clang++.exe");
        host.expect_contains("clang.exe --version", MockProcessOutput::success("clang version 16.0.6"));
        let request = ConfigRequest {
            platform: Some(Platform::Windows),
            build_type: Some(BuildType::Debug),
            generator: Some("ninja".parse().unwrap()),
            core_only: Some(false),
            build_tests: Some(false),
            build_examples: Some(false),
            ..ConfigRequest::default()
        };
        // clang 16 is listed but too old for C++23
        let prompter = ScriptedPrompter::new([Answer::SelectLabel("clang 16"), Answer::SelectLabel("clang-cl")]);

        let resolution = resolve_with(&host, &prompter, &windows_env(), &request, None).unwrap();
        assert_eq!(resolution.config.compiler, CompilerId::CLANG_CL);
        assert_eq!(prompter.prompts(), vec!["Select compiler", "Select compiler"]);
        assert!(resolution.needs_bootstrap);
    }

    #[test]
    fn test_prompt_cancel_is_cancelled() {
        let host = linux_host();
        let prompter = ScriptedPrompter::new([Answer::Cancel]);
        let err = resolve_with(&host, &prompter, &linux_env(), &linux_request(), None).unwrap_err();
        assert!(matches!(err, ConfigureError::Cancelled));
    }

    #[test]
    fn test_conan_defaults() {
        let mut host = linux_host();
        host.add_file("/usr/bin/conan");
        let request = ConfigRequest {
            build_type: Some(BuildType::Release),
            compiler: Some(CompilerId::GCC),
            generator: Some("ninja".parse().unwrap()),
            core_only: Some(false),
            build_tests: Some(false),
            build_examples: Some(false),
            ..linux_request()
        };

        // Off unless asked for when nobody can be asked
        let resolution = resolve_with(&host, &NonInteractivePrompter, &linux_env(), &request, None).unwrap();
        assert!(!resolution.config.dependency_manager);

        // Interactive default is yes when Conan is installed
        let prompter = ScriptedPrompter::new([Answer::Default]);
        let resolution = resolve_with(&host, &prompter, &linux_env(), &request, None).unwrap();
        assert!(resolution.config.dependency_manager);
        assert!(resolution.dependency_manager.is_some());
    }

    #[test]
    fn test_explicit_conan_without_conan_fails() {
        let host = linux_host();
        let request = ConfigRequest {
            dependency_manager: Some(true),
            ..linux_request()
        };
        let err = resolve_with(&host, &NonInteractivePrompter, &linux_env(), &request, None).unwrap_err();
        assert!(matches!(
            err,
            ConfigureError::Validation {
                field: Field::DependencyManager,
                ..
            }
        ));
    }

    #[test]
    fn test_windows_msvc_with_ninja_needs_bootstrap() {
        let host = windows_host();
        let request = ConfigRequest {
            platform: Some(Platform::Windows),
            ..ConfigRequest::default()
        };

        let resolution = resolve_with(&host, &NonInteractivePrompter, &windows_env(), &request, None).unwrap();
        assert_eq!(resolution.config.compiler, CompilerId::MSVC);
        assert_eq!(resolution.config.generator, Generator::Ninja);
        assert!(resolution.needs_bootstrap);

        // The Visual Studio generator sets up its own environment
        let request = ConfigRequest {
            generator: Some("vs2022".parse().unwrap()),
            ..request
        };
        let resolution = resolve_with(&host, &NonInteractivePrompter, &windows_env(), &request, None).unwrap();
        assert_eq!(resolution.config.generator, Generator::VisualStudio(VsVersion::Vs2022));
        assert!(!resolution.needs_bootstrap);
    }

    #[test]
    fn test_visual_studio_rejected_off_windows() {
        let host = linux_host();
        let request = ConfigRequest {
            generator: Some("msbuild".parse().unwrap()),
            ..linux_request()
        };
        let err = resolve_with(&host, &NonInteractivePrompter, &linux_env(), &request, None).unwrap_err();
        match err {
            ConfigureError::Validation { field, reason, .. } => {
                assert_eq!(field, Field::Generator);
                assert!(reason.contains("only available on Windows"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_cache_variables() {
        let mut host = MockHost::new();
        for tool in ["clang", "clang++", "llvm-ar", "llvm-ranlib"] {
            host.add_file(format!("/usr/lib/llvm-18/bin/{}", tool));
        }
        host.add_file("/opt/ninja/ninja");
        host.set_default(MockProcessOutput::success("clang version 18.1.0"));
        let env = EnvironmentContext::empty(Platform::Linux).with("PATH", "/usr/lib/llvm-18/bin:/opt/ninja");
        let request = ConfigRequest {
            build_type: Some(BuildType::Debug),
            build_tests: Some(true),
            ..linux_request()
        };

        let resolution = resolve_with(&host, &NonInteractivePrompter, &env, &request, None).unwrap();
        let vars = resolution.cache_variables("HELIOS", Some(Path::new("/ws/conan_toolchain.cmake")));

        assert_eq!(vars["CMAKE_BUILD_TYPE"], "Debug");
        assert_eq!(vars["CMAKE_CXX_COMPILER"], "/usr/lib/llvm-18/bin/clang++");
        assert_eq!(vars["CMAKE_AR"], "/usr/lib/llvm-18/bin/llvm-ar");
        assert_eq!(vars["CMAKE_RANLIB"], "/usr/lib/llvm-18/bin/llvm-ranlib");
        assert_eq!(vars["CMAKE_EXPORT_COMPILE_COMMANDS"], "ON");
        assert_eq!(vars["HELIOS_BUILD_TESTS"], "ON");
        assert_eq!(vars["HELIOS_USE_CONAN"], "OFF");
        assert_eq!(vars["CMAKE_TOOLCHAIN_FILE"], "/ws/conan_toolchain.cmake");
        // Found on PATH, so CMake can find it too
        assert!(!vars.contains_key("CMAKE_MAKE_PROGRAM"));
    }
}
