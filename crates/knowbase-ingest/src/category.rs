//! Filename-based category assignment.
//!
//! An ordered list of `(keywords, category)` rules is evaluated
//! top-to-bottom with a case-insensitive substring test; the first rule
//! with any matching keyword wins. The order encodes specificity and is
//! part of the contract: a file named `security-pipeline.yml` is
//! `security`, not `cicd`.

use knowbase_core::types::Category;

pub const CATEGORY_RULES: &[(&[&str], Category)] = &[
    (&["security", "sec", "compliance", "audit"], Category::Security),
    (&["ci", "cd", "pipeline", "deploy", "jenkins", "github-actions"], Category::Cicd),
    (&["kubernetes", "k8s", "docker", "container"], Category::Infrastructure),
    (&["ml", "ai", "model", "training", "mlops"], Category::AiEngineering),
    (&["aws", "cloud", "cert", "so3"], Category::CloudCertification),
    (&["resume", "cv"], Category::ProfessionalProfile),
    (&["project", "implementation"], Category::ProjectDocumentation),
];

pub fn categorize(file_name: &str) -> Category {
    let lower = file_name.to_lowercase();
    for (keywords, category) in CATEGORY_RULES {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return *category;
        }
    }
    Category::General
}
