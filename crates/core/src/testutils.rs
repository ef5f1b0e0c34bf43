//! Document fixtures for tests: minimal PDFs and DOCX packages built on disk.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Write a PDF with one page per entry of `pages`, each showing that text.
pub fn write_pdf(dir: &Path, name: &str, pages: &[&str]) -> io::Result<PathBuf> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let bytes = content.encode().map_err(io::Error::other)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, bytes));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path)?;
    Ok(path)
}

/// Write a DOCX package whose body holds one `w:p` per entry of `paragraphs`.
pub fn write_docx(dir: &Path, name: &str, paragraphs: &[&str]) -> io::Result<PathBuf> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", escape_xml(p)))
        .collect();
    write_docx_body(dir, name, &body)
}

/// Write a DOCX package with `body` as the raw inner XML of `w:body`.
pub fn write_docx_body(dir: &Path, name: &str, body: &str) -> io::Result<PathBuf> {
    let document = format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            "<w:body>{}</w:body></w:document>"
        ),
        body
    );

    let path = dir.join(name);
    let mut writer = zip::ZipWriter::new(File::create(&path)?);
    let options = zip::write::SimpleFileOptions::default();

    writer
        .start_file("[Content_Types].xml", options)
        .map_err(io::Error::other)?;
    writer.write_all(CONTENT_TYPES.as_bytes())?;
    writer
        .start_file("word/document.xml", options)
        .map_err(io::Error::other)?;
    writer.write_all(document.as_bytes())?;
    writer.finish().map_err(io::Error::other)?;

    Ok(path)
}

const CONTENT_TYPES: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Override PartName="/word/document.xml" "#,
    r#"ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    "</Types>"
);

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
