use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RepositoryInfo {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub stars: u64,
    #[serde(default)]
    pub forks: u64,
    #[serde(default)]
    pub license: Option<String>,
}

impl RepositoryInfo {
    /// Name and URL only, used when the hosting API gives nothing back
    pub fn basic(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            description: None,
            language: None,
            stars: 0,
            forks: 0,
            license: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AuthorInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Publication {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FunctionalityInfo {
    pub main_purpose: String,
    pub key_features: Vec<String>,
    pub input_formats: Vec<String>,
    pub output_formats: Vec<String>,
    pub dependencies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UsageInfo {
    pub installation: String,
    pub basic_usage: String,
    pub examples: Vec<String>,
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProjectArchitecture {
    pub programming_languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub directory_structure: BTreeMap<String, String>,
    pub main_components: Vec<String>,
    pub entry_points: Vec<String>,
    pub config_files: Vec<String>,
    pub test_structure: BTreeMap<String, String>,
}

impl ProjectArchitecture {
    pub fn is_empty(&self) -> bool {
        self.programming_languages.is_empty()
            && self.frameworks.is_empty()
            && self.directory_structure.is_empty()
            && self.main_components.is_empty()
            && self.entry_points.is_empty()
            && self.config_files.is_empty()
            && self.test_structure.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PerformanceInfo {
    pub time_complexity: Option<String>,
    pub space_complexity: Option<String>,
    pub parallelization: Option<String>,
    pub resource_usage: Option<String>,
    pub optimization_suggestions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DeploymentInfo {
    pub installation_methods: Vec<String>,
    pub system_requirements: Vec<String>,
    pub container_support: Vec<String>,
    pub cloud_deployment: Vec<String>,
    pub configuration_files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TestingInfo {
    pub test_commands: Vec<String>,
    pub test_data_sources: Vec<String>,
    pub example_datasets: Vec<String>,
    pub validation_methods: Vec<String>,
    pub benchmark_datasets: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DataRequirements {
    pub required_inputs: Vec<String>,
    pub optional_inputs: Vec<String>,
    pub data_formats: Vec<String>,
    pub file_size_limits: Option<String>,
    pub preprocessing_steps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CodeQualityInfo {
    pub code_structure: Option<String>,
    pub documentation_quality: Option<String>,
    pub test_coverage: Option<String>,
    pub best_practices: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BioinformaticsExpertise {
    pub data_types: Vec<String>,
    pub algorithm_accuracy: Option<String>,
    pub applicable_scenarios: Vec<String>,
    pub standards_compliance: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UsabilityInfo {
    pub documentation_completeness: Option<String>,
    pub learning_curve: Option<String>,
    pub community_support: Option<String>,
    pub user_interface: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SecurityAnalysis {
    pub vulnerabilities: Vec<String>,
    pub sensitive_data: Vec<String>,
    pub dependencies: Vec<String>,
}

/// The assembled result of one analysis. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    pub repository: RepositoryInfo,
    pub authors: Vec<AuthorInfo>,
    pub publications: Vec<Publication>,
    pub functionality: FunctionalityInfo,
    pub usage: UsageInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<ProjectArchitecture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bioinformatics_expertise: Option<BioinformaticsExpertise>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_requirements: Option<DataRequirements>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_analysis: Option<SecurityAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_quality: Option<CodeQualityInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testing: Option<TestingInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usability: Option<UsabilityInfo>,
    pub analysis_timestamp: String,
}

impl AnalysisReport {
    /// Nested field-group mapping, as persisted and rendered to JSON
    pub fn to_record(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Names of the optional field-groups that carry data
    pub fn present_groups(&self) -> Vec<&'static str> {
        let mut groups = Vec::new();
        if self.architecture.is_some() {
            groups.push("architecture");
        }
        if self.performance.is_some() {
            groups.push("performance");
        }
        if self.bioinformatics_expertise.is_some() {
            groups.push("bioinformatics_expertise");
        }
        if self.data_requirements.is_some() {
            groups.push("data_requirements");
        }
        if self.security_analysis.is_some() {
            groups.push("security_analysis");
        }
        if self.code_quality.is_some() {
            groups.push("code_quality");
        }
        if self.deployment.is_some() {
            groups.push("deployment");
        }
        if self.testing.is_some() {
            groups.push("testing");
        }
        if self.usability.is_some() {
            groups.push("usability");
        }
        groups
    }
}
