use std::fs;
use std::path::Path;
use tempfile::TempDir;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};

use knowbase_core::types::{Category, DocType};
use knowbase_ingest::Normalizer;

fn normalizer(tmp: &TempDir) -> Normalizer {
    Normalizer::new(tmp.path().join("repos"))
}

/// One page per entry in `page_texts`, plus an optional trailing page
/// whose content stream is not valid page description syntax.
fn write_pdf(path: &Path, page_texts: &[&str], with_broken_page: bool) -> anyhow::Result<()> {
    let mut pdf = lopdf::Document::with_version("1.5");
    let pages_id = pdf.new_object_id();
    let font_id = pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = pdf.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let mut kids: Vec<Object> = Vec::new();
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = pdf.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    if with_broken_page {
        let content_id =
            pdf.add_object(Stream::new(dictionary! {}, b"not a content stream".to_vec()));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    let count = kids.len() as i64;
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.save(path)?;
    Ok(())
}

fn commit_all(repo: &git2::Repository, message: &str) -> anyhow::Result<()> {
    let mut index = repo.index()?;
    index.add_all(["*"], git2::IndexAddOption::DEFAULT, None)?;
    index.write()?;
    let tree = repo.find_tree(index.write_tree()?)?;
    let sig = git2::Signature::now("tester", "tester@example.com")?;
    match repo.head().ok().and_then(|h| h.peel_to_commit().ok()) {
        Some(parent) => repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])?,
        None => repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[])?,
    };
    Ok(())
}

#[test]
fn text_file_is_read_verbatim() {
    let tmp = TempDir::new().expect("tempdir");
    let path = tmp.path().join("meeting-notes.txt");
    fs::write(&path, "line one\nline two\n").expect("write");

    let doc = normalizer(&tmp).normalize_file(&path).expect("normalize");
    assert_eq!(doc.content, "line one\nline two\n");
    assert_eq!(doc.meta.doc_type, DocType::Text);
    assert_eq!(doc.meta.category, Category::General);
}

#[test]
fn markdown_is_stripped_and_tagged() {
    let tmp = TempDir::new().expect("tempdir");
    let path = tmp.path().join("kubernetes-setup.md");
    fs::write(&path, "# Cluster Setup\n\nUse **RBAC** everywhere.\n").expect("write");

    let doc = normalizer(&tmp).normalize_file(&path).expect("normalize");
    assert!(doc.content.contains("Cluster Setup"));
    assert!(doc.content.contains("Use RBAC everywhere."));
    assert!(!doc.content.contains('#'));
    assert!(!doc.content.contains('*'));
    assert_eq!(doc.meta.category, Category::Infrastructure);
    assert_eq!(
        doc.meta.extra.get("original_format").map(String::as_str),
        Some("markdown")
    );
}

#[test]
fn filename_category_flows_into_metadata() {
    let tmp = TempDir::new().expect("tempdir");
    let n = normalizer(&tmp);

    for (name, want) in [
        ("security-policy.txt", Category::Security),
        ("pipeline-config.yaml", Category::Cicd),
        ("resume-draft.txt", Category::ProfessionalProfile),
    ] {
        let path = tmp.path().join(name);
        fs::write(&path, "content").expect("write");
        let doc = n.normalize_file(&path).expect("normalize");
        assert_eq!(doc.meta.category, want, "{name}");
    }
}

#[test]
fn malformed_pdf_is_an_error_not_a_panic() {
    let tmp = TempDir::new().expect("tempdir");
    let path = tmp.path().join("broken.pdf");
    fs::write(&path, b"this is not a pdf at all").expect("write");

    assert!(normalizer(&tmp).normalize_file(&path).is_err());
}

#[test]
fn unsupported_extension_is_rejected() {
    let tmp = TempDir::new().expect("tempdir");
    let path = tmp.path().join("image.png");
    fs::write(&path, b"\x89PNG").expect("write");

    let err = normalizer(&tmp).normalize_file(&path).expect_err("png must be rejected");
    assert!(err.to_string().contains("Unsupported document format"));
}

#[test]
fn pdf_pages_concatenate_in_order_and_bad_pages_are_skipped() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("security-runbook.pdf");
    write_pdf(&path, &["alpha page body", "bravo page body"], true)?;

    let doc = normalizer(&tmp).normalize_file(&path)?;
    assert_eq!(doc.meta.doc_type, DocType::Pdf);
    assert_eq!(doc.meta.category, Category::Security);
    // the unreadable page still counts toward the page total
    assert_eq!(doc.meta.extra.get("pages").map(String::as_str), Some("3"));
    let first = doc.content.find("alpha page body").expect("first page text");
    let second = doc.content.find("bravo page body").expect("second page text");
    assert!(first < second, "pages must concatenate in page order");
    Ok(())
}

#[test]
fn repository_ingestion_tags_documents_and_updates_in_place() -> anyhow::Result<()> {
    let tmp = TempDir::new()?;
    let src = tmp.path().join("sample-service");
    fs::create_dir_all(&src)?;
    let repo = git2::Repository::init(&src)?;
    fs::write(src.join("deploy-guide.md"), "# Rollout\n\nStage then promote.\n")?;
    fs::write(src.join("service.yml"), "replicas: 2\n")?;
    fs::write(src.join("generated.json"), "x".repeat(60_000))?;
    fs::write(src.join("main.rs"), "fn main() {}\n")?;
    commit_all(&repo, "initial")?;

    let url = src.to_string_lossy().to_string();
    let n = normalizer(&tmp);
    let docs = n.process_repository(&url)?;
    assert_eq!(docs.len(), 2, "markdown plus small config only");
    for d in &docs {
        assert_eq!(d.meta.repo.as_deref(), Some("sample-service"));
        assert_eq!(d.meta.repo_url.as_deref(), Some(url.as_str()));
    }
    let config = docs
        .iter()
        .find(|d| d.content.contains("replicas"))
        .expect("config doc");
    assert_eq!(
        config.meta.extra.get("file_type").map(String::as_str),
        Some("configuration")
    );
    let guide = docs
        .iter()
        .find(|d| d.content.contains("Stage then promote."))
        .expect("markdown doc");
    assert!(guide.meta.extra.get("file_type").is_none());

    // a commit made after the first run must arrive through fetch into
    // the existing checkout, not through a fresh clone
    fs::write(src.join("audit-checklist.md"), "Review RBAC quarterly.\n")?;
    commit_all(&repo, "add checklist")?;
    let docs = n.process_repository(&url)?;
    assert_eq!(docs.len(), 3);
    assert!(docs.iter().any(|d| d.content.contains("Review RBAC quarterly.")));
    Ok(())
}

#[test]
fn directory_walk_isolates_per_file_failures() {
    let tmp = TempDir::new().expect("tempdir");
    let dir = tmp.path().join("docs");
    fs::create_dir_all(dir.join("nested")).expect("mkdir");
    fs::write(dir.join("good-notes.txt"), "usable content").expect("write");
    fs::write(dir.join("nested/readme.md"), "# Title\n\nbody text\n").expect("write");
    fs::write(dir.join("broken.pdf"), b"not a pdf").expect("write");
    fs::write(dir.join("image.png"), b"\x89PNG").expect("write");

    let docs = normalizer(&tmp).process_directory(&dir).expect("walk");
    assert_eq!(docs.len(), 2, "bad and unsupported files are skipped");
    assert!(docs.iter().any(|d| d.content.contains("usable content")));
    assert!(docs.iter().any(|d| d.content.contains("body text")));
}

#[test]
fn missing_directory_is_an_error() {
    let tmp = TempDir::new().expect("tempdir");
    let missing = tmp.path().join("nope");
    assert!(normalizer(&tmp).process_directory(&missing).is_err());
}
