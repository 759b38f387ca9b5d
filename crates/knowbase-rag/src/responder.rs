//! Deterministic, rule-based answer synthesis. This is template assembly,
//! not generation: fixed keyword tables drive which lines of retrieved
//! context surface and which canned recommendation list is attached.

use knowbase_core::types::ScoredContext;

use crate::service::KnowledgeBaseInfo;

pub const NO_CONTEXT_ANSWER: &str = "I don't have specific information about that topic in the knowledge base. Please try a more specific question about DevSecOps, CI/CD security, AWS, Kubernetes, or AI/ML engineering.";

const CONTEXT_BLOCK_HEADER: &str = "RELEVANT KNOWLEDGE FROM THE KNOWLEDGE BASE:";

const KEY_POINT_KEYWORDS: &[&str] = &["security", "implement", "deploy", "configure", "best practice"];
const KEY_POINT_MAX: usize = 3;
const KEY_POINT_WIDTH: usize = 200;
const KEY_POINT_FALLBACK: &str = "• Relevant technical documentation and implementation guides available";

const SECURITY_KEYWORDS: &[&str] =
    &["security", "secure", "vulnerability", "threat", "risk", "compliance", "audit"];
const SECURITY_MAX: usize = 2;
const SECURITY_WIDTH: usize = 150;
const SECURITY_FALLBACK: &str =
    "• Always prioritize security in implementation\n• Regular security reviews and updates recommended";

/// Question-keyword decision table for the recommendations section,
/// evaluated top-to-bottom, first match wins. Selection depends only on
/// the question, never on the retrieved context.
const RECOMMENDATION_RULES: &[(&[&str], &str)] = &[
    (
        &["kubernetes", "k8s"],
        "• Implement RBAC and network policies\n• Use Pod Security Standards\n• Regular security scanning of container images\n• Monitor cluster activity with audit logging",
    ),
    (
        &["ci/cd", "pipeline"],
        "• Integrate SAST/DAST tools in pipeline\n• Use secure secrets management\n• Implement branch protection rules\n• Automated security testing at each stage",
    ),
    (
        &["aws", "cloud"],
        "• Follow AWS Well-Architected Security Pillar\n• Implement least privilege IAM policies\n• Enable CloudTrail and GuardDuty\n• Use AWS Config for compliance monitoring",
    ),
    (
        &["ai", "ml", "model"],
        "• Implement MLSecOps practices\n• Secure model training pipelines\n• Monitor for model drift and bias\n• Protect sensitive training data",
    ),
];
const GENERIC_RECOMMENDATIONS: &str = "• Follow security-first development practices\n• Implement proper monitoring and logging\n• Regular security assessments and updates\n• Documentation and knowledge sharing";

/// Format retrieved contexts into the labeled block the line scanners
/// operate on, in the given (relevance) order.
pub fn build_context_block(contexts: &[ScoredContext]) -> String {
    let mut block = format!("{CONTEXT_BLOCK_HEADER}\n\n");
    for (i, ctx) in contexts.iter().enumerate() {
        block.push_str(&format!(
            "[Source {} - {}] ({}):\n{}\n\n",
            i + 1,
            ctx.meta.category.title(),
            ctx.meta.file_name(),
            ctx.content
        ));
    }
    block
}

/// Synthesize the structured answer for a question from its retrieved
/// contexts. Empty contexts produce the canned no-information reply.
pub fn compose_answer(question: &str, contexts: &[ScoredContext]) -> String {
    if contexts.is_empty() {
        return NO_CONTEXT_ANSWER.to_string();
    }
    let block = build_context_block(contexts);
    format!(
        "Based on the indexed knowledge base, here's what I can tell you about your question: \"{question}\"\n\n\
         **Key Information:**\n{}\n\n\
         **Practical Recommendations:**\n{}\n\n\
         **Security Considerations:**\n{}\n\n\
         *This response is based on documented experience in DevSecOps, AI engineering, and cloud architecture.*",
        key_points(&block),
        recommendations(question),
        security_notes(&block)
    )
}

fn key_points(block: &str) -> String {
    let mut points = Vec::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(CONTEXT_BLOCK_HEADER) || line.starts_with("[Source") {
            continue;
        }
        let lower = line.to_lowercase();
        if KEY_POINT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            points.push(format!("• {}", truncate_chars(line, KEY_POINT_WIDTH)));
            if points.len() >= KEY_POINT_MAX {
                break;
            }
        }
    }
    if points.is_empty() {
        KEY_POINT_FALLBACK.to_string()
    } else {
        points.join("\n")
    }
}

fn recommendations(question: &str) -> &'static str {
    let lower = question.to_lowercase();
    for (keywords, bullets) in RECOMMENDATION_RULES {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return bullets;
        }
    }
    GENERIC_RECOMMENDATIONS
}

fn security_notes(block: &str) -> String {
    let mut notes = Vec::new();
    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("[Source") {
            continue;
        }
        let lower = line.to_lowercase();
        if SECURITY_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            notes.push(format!("• {}", truncate_chars(line, SECURITY_WIDTH)));
            if notes.len() >= SECURITY_MAX {
                break;
            }
        }
    }
    if notes.is_empty() {
        SECURITY_FALLBACK.to_string()
    } else {
        notes.join("\n")
    }
}

/// Fixed expertise overview, plus a knowledge-base size line once
/// anything has been indexed.
pub fn expertise_summary(info: &KnowledgeBaseInfo) -> String {
    let mut summary = String::from(
        "This knowledge base covers DevSecOps and AI engineering practice:\n\n\
         **DevSecOps & Security:**\n\
         - CI/CD pipeline security and automation\n\
         - Infrastructure security and compliance\n\
         - Security scanning and vulnerability management\n\n\
         **Cloud & Infrastructure:**\n\
         - AWS security and compliance\n\
         - Kubernetes security and best practices\n\
         - Infrastructure as Code security\n\n\
         **AI/ML Engineering:**\n\
         - MLOps and MLSecOps implementation\n\
         - Model security and governance\n\
         - Machine learning infrastructure\n",
    );
    if info.total_chunks > 0 {
        summary.push_str(&format!(
            "\n**Knowledge Base:** {} indexed chunks across {} categories",
            info.total_chunks,
            info.categories.len()
        ));
    }
    summary
}

/// Character-boundary-safe prefix truncation.
fn truncate_chars(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}
