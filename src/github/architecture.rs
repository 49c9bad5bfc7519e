use crate::analysis::ProjectArchitecture;
use crate::discovery::read_named_file;
use ignore::WalkBuilder;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const SKIP_DIRS: &[&str] = &["node_modules", "venv", "__pycache__", ".git"];
const MAX_STRUCTURE_DEPTH: usize = 3;

const EXTENSION_LANGUAGES: &[(&str, &str)] = &[
    ("py", "Python"),
    ("js", "JavaScript"),
    ("ts", "TypeScript"),
    ("java", "Java"),
    ("cpp", "C++"),
    ("cc", "C++"),
    ("cxx", "C++"),
    ("hpp", "C++"),
    ("c", "C"),
    ("h", "C"),
    ("cs", "C#"),
    ("go", "Go"),
    ("rs", "Rust"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("swift", "Swift"),
    ("kt", "Kotlin"),
    ("R", "R"),
    ("r", "R"),
    ("sql", "SQL"),
    ("sh", "Shell"),
    ("pl", "Perl"),
    ("lua", "Lua"),
    ("dart", "Dart"),
    ("scala", "Scala"),
    ("m", "Objective-C"),
    ("jl", "Julia"),
    ("nf", "Nextflow"),
    ("smk", "Snakemake"),
    ("wdl", "WDL"),
    ("hs", "Haskell"),
    ("ex", "Elixir"),
    ("exs", "Elixir"),
    ("ml", "OCaml"),
];

const MANIFEST_LANGUAGES: &[(&str, &str)] = &[
    ("Cargo.toml", "Rust"),
    ("go.mod", "Go"),
    ("package.json", "JavaScript"),
    ("requirements.txt", "Python"),
    ("setup.py", "Python"),
    ("pyproject.toml", "Python"),
    ("DESCRIPTION", "R"),
    ("Snakefile", "Snakemake"),
];

/// Manifest file, then `(needle, framework)` pairs matched case-insensitively
const FRAMEWORK_MANIFESTS: &[(&str, &[(&str, &str)])] = &[
    (
        "requirements.txt",
        &[
            ("django", "Django"),
            ("flask", "Flask"),
            ("fastapi", "FastAPI"),
            ("streamlit", "Streamlit"),
            ("numpy", "NumPy"),
            ("pandas", "Pandas"),
            ("scikit-learn", "Scikit-learn"),
            ("tensorflow", "TensorFlow"),
            ("torch", "PyTorch"),
            ("biopython", "Biopython"),
            ("pysam", "pysam"),
        ],
    ),
    (
        "setup.py",
        &[
            ("django", "Django"),
            ("flask", "Flask"),
            ("fastapi", "FastAPI"),
            ("numpy", "NumPy"),
            ("biopython", "Biopython"),
            ("pysam", "pysam"),
        ],
    ),
    (
        "pyproject.toml",
        &[
            ("django", "Django"),
            ("flask", "Flask"),
            ("fastapi", "FastAPI"),
            ("numpy", "NumPy"),
            ("biopython", "Biopython"),
            ("pysam", "pysam"),
        ],
    ),
    (
        "package.json",
        &[
            ("react", "React"),
            ("vue", "Vue.js"),
            ("angular", "Angular"),
            ("express", "Express"),
            ("svelte", "Svelte"),
        ],
    ),
    (
        "pom.xml",
        &[("spring", "Spring"), ("hibernate", "Hibernate"), ("htsjdk", "HTSJDK")],
    ),
    (
        "build.gradle",
        &[("spring", "Spring"), ("htsjdk", "HTSJDK")],
    ),
];

const SPECIAL_FILES: &[(&str, &str)] = &[
    ("Dockerfile", "Docker container"),
    ("docker-compose.yml", "Docker Compose"),
    ("docker-compose.yaml", "Docker Compose"),
    ("Makefile", "Make build"),
    ("CMakeLists.txt", "CMake build"),
    ("pom.xml", "Maven project"),
    ("build.gradle", "Gradle project"),
    ("package.json", "Node.js project"),
    ("environment.yml", "Conda environment"),
    ("meta.yaml", "Conda recipe"),
    ("Snakefile", "Snakemake workflow"),
    ("main.nf", "Nextflow workflow"),
];

const CONFIG_FILES: &[&str] = &[
    "config.json",
    "config.yaml",
    "config.yml",
    "config.toml",
    "settings.json",
    "settings.yaml",
    "settings.yml",
    ".env",
    ".env.example",
    "application.properties",
    "application.yml",
    "nextflow.config",
    "docker-compose.yml",
    "docker-compose.yaml",
];

const TEST_DIRS: &[&str] = &["test", "tests", "spec", "specs"];

/// Static layout analysis of a checked-out repository
pub fn analyze_architecture(repo: &Path) -> ProjectArchitecture {
    ProjectArchitecture {
        programming_languages: detect_languages(repo),
        frameworks: detect_frameworks(repo),
        directory_structure: directory_structure(repo),
        main_components: main_components(repo),
        entry_points: entry_points(repo),
        config_files: config_files(repo),
        test_structure: test_structure(repo),
    }
}

fn is_skipped(name: &str) -> bool {
    name.starts_with('.') || SKIP_DIRS.contains(&name)
}

pub fn detect_languages(repo: &Path) -> Vec<String> {
    let mut languages = BTreeSet::new();

    let walker = WalkBuilder::new(repo)
        .hidden(true)
        .git_ignore(true)
        .filter_entry(|entry| {
            entry.depth() == 0 || !is_skipped(&entry.file_name().to_string_lossy())
        })
        .build();

    for entry in walker.flatten() {
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let Some(ext) = entry.path().extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if let Some((_, language)) = EXTENSION_LANGUAGES.iter().find(|(e, _)| *e == ext) {
            languages.insert(language.to_string());
        }
    }

    for (manifest, language) in MANIFEST_LANGUAGES {
        if repo.join(manifest).is_file() {
            languages.insert(language.to_string());
        }
    }

    languages.into_iter().collect()
}

pub fn detect_frameworks(repo: &Path) -> Vec<String> {
    let mut frameworks = BTreeSet::new();
    for (manifest, needles) in FRAMEWORK_MANIFESTS {
        let Some(content) = read_named_file(repo, manifest) else {
            continue;
        };
        let lowered = content.to_lowercase();
        for (needle, framework) in needles.iter() {
            if lowered.contains(needle) {
                frameworks.insert(framework.to_string());
            }
        }
    }
    frameworks.into_iter().collect()
}

fn directory_purpose(name: &str) -> &'static str {
    match name.to_lowercase().as_str() {
        "src" | "source" => "source code",
        "lib" | "libs" | "library" => "libraries",
        "bin" => "executables",
        "dist" | "build" | "out" | "target" => "build output",
        "test" | "tests" | "spec" | "specs" => "tests",
        "docs" | "doc" | "documentation" => "documentation",
        "config" | "conf" | "cfg" => "configuration",
        "scripts" | "script" => "scripts",
        "tools" | "utils" | "util" => "utilities",
        "examples" | "example" | "demo" | "demos" => "examples",
        "data" | "datasets" => "data",
        "workflow" | "workflows" | "pipelines" => "workflows",
        "notebooks" => "notebooks",
        "assets" | "static" | "public" => "static assets",
        "templates" => "templates",
        "models" => "models",
        "api" => "API",
        _ => "directory",
    }
}

pub fn directory_structure(repo: &Path) -> BTreeMap<String, String> {
    let mut structure = BTreeMap::new();
    walk_structure(repo, "", 1, &mut structure);
    structure
}

fn walk_structure(dir: &Path, prefix: &str, depth: usize, out: &mut BTreeMap<String, String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        let path = entry.path();
        if path.is_dir() {
            if is_skipped(&name) {
                continue;
            }
            let key = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}/{}", prefix, name)
            };
            out.insert(key.clone(), directory_purpose(&name).to_string());
            if depth < MAX_STRUCTURE_DEPTH {
                walk_structure(&path, &key, depth + 1, out);
            }
        } else if prefix.is_empty() && path.is_file() && !name.starts_with('.') {
            out.insert(name, "root file".to_string());
        }
    }
}

pub fn main_components(repo: &Path) -> Vec<String> {
    let mut components = BTreeSet::new();
    if let Ok(entries) = std::fs::read_dir(repo) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.path().is_dir() && !is_skipped(&name) {
                components.insert(name);
            }
        }
    }
    for (file, component) in SPECIAL_FILES {
        if repo.join(file).is_file() {
            components.insert(component.to_string());
        }
    }
    components.into_iter().collect()
}

pub fn entry_points(repo: &Path) -> Vec<String> {
    let mut entries = Vec::new();

    if let Some(setup) = read_named_file(repo, "setup.py") {
        if setup.contains("console_scripts") {
            entries.push("Python console scripts (setup.py)".to_string());
        }
    }
    if let Some(pyproject) = read_named_file(repo, "pyproject.toml") {
        if pyproject.contains("[project.scripts]") || pyproject.contains("[tool.poetry.scripts]") {
            entries.push("Python console scripts (pyproject.toml)".to_string());
        }
    }

    let mut root_files: Vec<String> = std::fs::read_dir(repo)
        .map(|rd| {
            rd.flatten()
                .filter(|e| e.path().is_file())
                .map(|e| e.file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    root_files.sort();

    for name in root_files {
        if name.starts_with("main.") || name == "__main__.py" {
            entries.push(format!("main program: {}", name));
        } else if name == "app.py" || name == "application.py" || name == "cli.py" {
            entries.push(format!("application entry: {}", name));
        }
    }

    let scripts = repo.join("scripts");
    if let Ok(rd) = std::fs::read_dir(&scripts) {
        let mut names: Vec<String> = rd
            .flatten()
            .filter(|e| is_executable(&e.path()))
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        entries.extend(names.into_iter().map(|n| format!("executable script: scripts/{}", n)));
    }

    if let Some(package) = read_named_file(repo, "package.json") {
        if package.contains("\"start\"") || package.contains("\"dev\"") {
            entries.push("Node.js application (npm start)".to_string());
        }
    }

    entries
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

pub fn config_files(repo: &Path) -> Vec<String> {
    let mut found: Vec<String> = CONFIG_FILES
        .iter()
        .filter(|name| repo.join(name).is_file())
        .map(|name| name.to_string())
        .collect();

    for dir in ["config", "conf", "cfg"] {
        if let Ok(rd) = std::fs::read_dir(repo.join(dir)) {
            let mut names: Vec<String> = rd
                .flatten()
                .filter(|e| e.path().is_file())
                .map(|e| format!("{}/{}", dir, e.file_name().to_string_lossy()))
                .collect();
            names.sort();
            found.extend(names);
        }
    }
    found
}

pub fn test_structure(repo: &Path) -> BTreeMap<String, String> {
    let mut structure = BTreeMap::new();

    for dir in TEST_DIRS {
        let Ok(rd) = std::fs::read_dir(repo.join(dir)) else {
            continue;
        };
        for entry in rd.flatten() {
            let key = format!("{}/{}", dir, entry.file_name().to_string_lossy());
            let kind = if entry.path().is_dir() {
                "test directory"
            } else {
                "test file"
            };
            structure.insert(key, kind.to_string());
        }
    }

    if let Ok(rd) = std::fs::read_dir(repo) {
        for entry in rd.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.path().is_file() && name.to_lowercase().contains("test") {
                structure.insert(name, "root test file".to_string());
            }
        }
    }
    structure
}
