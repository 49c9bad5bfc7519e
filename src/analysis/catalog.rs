use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A named cluster of related report fields that a task can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Publications,
    Functionality,
    Usage,
    Architecture,
    Performance,
    BioinformaticsExpertise,
    DataRequirements,
    SecurityAnalysis,
    CodeQuality,
    Deployment,
    Testing,
    Usability,
}

impl FieldGroup {
    /// Always requested, whatever the configuration says
    pub const MANDATORY: [FieldGroup; 3] = [
        FieldGroup::Publications,
        FieldGroup::Functionality,
        FieldGroup::Usage,
    ];

    pub const OPTIONAL: [FieldGroup; 9] = [
        FieldGroup::Architecture,
        FieldGroup::Performance,
        FieldGroup::BioinformaticsExpertise,
        FieldGroup::DataRequirements,
        FieldGroup::SecurityAnalysis,
        FieldGroup::CodeQuality,
        FieldGroup::Deployment,
        FieldGroup::Testing,
        FieldGroup::Usability,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FieldGroup::Publications => "publications",
            FieldGroup::Functionality => "functionality",
            FieldGroup::Usage => "usage",
            FieldGroup::Architecture => "architecture",
            FieldGroup::Performance => "performance",
            FieldGroup::BioinformaticsExpertise => "bioinformatics_expertise",
            FieldGroup::DataRequirements => "data_requirements",
            FieldGroup::SecurityAnalysis => "security_analysis",
            FieldGroup::CodeQuality => "code_quality",
            FieldGroup::Deployment => "deployment",
            FieldGroup::Testing => "testing",
            FieldGroup::Usability => "usability",
        }
    }

    pub fn is_mandatory(&self) -> bool {
        Self::MANDATORY.contains(self)
    }

    /// JSON shape shown to the model. Every value is an angle-bracket slot,
    /// so an echoed hint is stripped as placeholders.
    pub fn schema_hint(&self) -> &'static str {
        match self {
            FieldGroup::Publications => {
                r#""publications": [{"title": "<exact paper title from the README>", "authors": ["<name>"], "journal": "<journal>", "year": "<year>", "doi": "<doi>"}]"#
            }
            FieldGroup::Functionality => {
                r#""functionality": {"main_purpose": "<one sentence>", "key_features": ["<feature>"], "input_formats": ["<input format such as FASTA>"], "output_formats": ["<output format such as VCF>"], "dependencies": ["<dependency>"]}"#
            }
            FieldGroup::Usage => {
                r#""usage": {"installation": "<exact install command>", "basic_usage": "<basic command>", "examples": ["<example>"], "parameters": ["<parameter>"]}"#
            }
            FieldGroup::Architecture => {
                r#""architecture": {"programming_languages": ["<language>"], "frameworks": ["<framework>"], "main_components": ["<component>"], "entry_points": ["<file>"], "config_files": ["<file>"]}"#
            }
            FieldGroup::Performance => {
                r#""performance": {"time_complexity": "<complexity>", "space_complexity": "<complexity>", "parallelization": "<threads, MPI, GPU...>", "resource_usage": "<memory and CPU needs>", "optimization_suggestions": ["<suggestion>"]}"#
            }
            FieldGroup::BioinformaticsExpertise => {
                r#""bioinformatics_expertise": {"data_types": ["<genomic, transcriptomic...>"], "algorithm_accuracy": "<accuracy evidence>", "applicable_scenarios": ["<scenario>"], "standards_compliance": ["<standard>"]}"#
            }
            FieldGroup::DataRequirements => {
                r#""data_requirements": {"required_inputs": ["<input>"], "optional_inputs": ["<input>"], "data_formats": ["<format such as GFF3>"], "file_size_limits": "<limit>", "preprocessing_steps": ["<step>"]}"#
            }
            FieldGroup::SecurityAnalysis => {
                r#""security_analysis": {"vulnerabilities": ["<issue>"], "sensitive_data": ["<finding>"], "dependencies": ["<risky dependency>"]}"#
            }
            FieldGroup::CodeQuality => {
                r#""code_quality": {"code_structure": "<assessment>", "documentation_quality": "<assessment>", "test_coverage": "<assessment>", "best_practices": ["<practice>"]}"#
            }
            FieldGroup::Deployment => {
                r#""deployment": {"installation_methods": ["<method such as conda>"], "system_requirements": ["<requirement>"], "container_support": ["<container such as Docker>"], "cloud_deployment": ["<platform>"], "configuration_files": ["<file>"]}"#
            }
            FieldGroup::Testing => {
                r#""testing": {"test_commands": ["<command>"], "test_data_sources": ["<source>"], "example_datasets": ["<file>"], "validation_methods": ["<method>"], "benchmark_datasets": ["<dataset>"]}"#
            }
            FieldGroup::Usability => {
                r#""usability": {"documentation_completeness": "<assessment>", "learning_curve": "<assessment>", "community_support": "<assessment>", "user_interface": "<CLI, GUI, web...>"}"#
            }
        }
    }
}

impl std::fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One named unit of extraction work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTask {
    pub role: String,
    pub description: String,
    pub focus: Vec<FieldGroup>,
}

/// Persona and tool permissions for an extraction role
#[derive(Debug, Clone, Copy)]
pub struct AgentProfile {
    pub role: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
    pub tools: &'static [&'static str],
}

pub const AGENT_PROFILES: &[AgentProfile] = &[
    AgentProfile {
        role: "biotools-analyzer",
        description: "Bioinformatics tool analyst for genomic data processing tools, algorithms and research software quality",
        prompt: "You are an expert in bioinformatics tooling. You understand sequence alignment, assembly and annotation algorithms, \
the common data formats (FASTA, FASTQ, SAM/BAM, VCF, GFF) and workflow managers. Identify the concrete algorithms and formats \
a project uses, judge its fitness for research use and base every statement on the actual code and documentation.",
        tools: &["Read", "Grep", "Glob", "Bash", "WebSearch"],
    },
    AgentProfile {
        role: "security-auditor",
        description: "Code security and quality auditor focused on vulnerabilities, risk assessment and best practices",
        prompt: "You are a code security and quality auditor. Look for injection risks, missing input validation, unsafe file handling, \
leaked secrets and risky dependencies. Assess code structure, maintainability and error handling. Report only issues you can point to.",
        tools: &["Read", "Grep", "Bash"],
    },
    AgentProfile {
        role: "deployment-expert",
        description: "Deployment and DevOps specialist for installation, testing strategy and operability",
        prompt: "You are a deployment and DevOps specialist. Determine how the tool is installed (pip, conda, docker, source builds), \
what it needs to run, how it is tested and which example or benchmark data ships with it. Judge documentation and ease of use.",
        tools: &["Read", "Grep", "Glob", "Bash"],
    },
];

pub fn profile(role: &str) -> Option<&'static AgentProfile> {
    AGENT_PROFILES.iter().find(|p| p.role == role)
}

/// Ordered, read-only list of analysis tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCatalog {
    tasks: Vec<AnalysisTask>,
}

impl TaskCatalog {
    /// The standard three-role catalog restricted to the enabled optional
    /// groups. Same input, same tasks in the same order.
    pub fn standard(enabled: &[FieldGroup]) -> Self {
        let keep = |group: &FieldGroup| group.is_mandatory() || enabled.contains(group);

        let definitions: [(&str, &str, &[FieldGroup]); 3] = [
            (
                "biotools-analyzer",
                "Bioinformatics functionality and algorithm analysis",
                &[
                    FieldGroup::Functionality,
                    FieldGroup::Publications,
                    FieldGroup::Architecture,
                    FieldGroup::Performance,
                    FieldGroup::BioinformaticsExpertise,
                    FieldGroup::DataRequirements,
                ],
            ),
            (
                "security-auditor",
                "Code security and quality audit",
                &[FieldGroup::SecurityAnalysis, FieldGroup::CodeQuality],
            ),
            (
                "deployment-expert",
                "Deployment, testing and usability analysis",
                &[
                    FieldGroup::Usage,
                    FieldGroup::Deployment,
                    FieldGroup::Testing,
                    FieldGroup::Usability,
                ],
            ),
        ];

        let tasks = definitions
            .into_iter()
            .filter_map(|(role, description, focus)| {
                let focus: Vec<FieldGroup> = focus.iter().copied().filter(keep).collect();
                (!focus.is_empty()).then(|| AnalysisTask {
                    role: role.to_string(),
                    description: description.to_string(),
                    focus,
                })
            })
            .collect();

        Self { tasks }
    }

    #[cfg(test)]
    pub fn from_tasks(tasks: Vec<AnalysisTask>) -> Self {
        Self { tasks }
    }

    pub fn tasks(&self) -> &[AnalysisTask] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }
}
