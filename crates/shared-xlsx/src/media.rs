//! Embedded image extraction from the XLSX package
//!
//! Resolution chain per sheet:
//! `xl/workbook.xml` (sheet name → rId) → workbook rels (rId → worksheet part)
//! → worksheet rels (drawing part) → drawing `<a:blip r:embed>` references
//! → drawing rels (rId → media part).

use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Seek};

use quick_xml::events::Event;
use quick_xml::Reader;
use shared_types::EmbeddedImage;
use zip::ZipArchive;

use crate::XlsxError;

const DRAWING_REL_SUFFIX: &str = "/drawing";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    id: String,
    target: String,
    kind: String,
}

/// Extract embedded images, keyed by sheet name, in drawing order.
///
/// An individual image whose media part is missing or unreadable is skipped
/// with a warning; it does not fail the whole extraction.
pub fn extract_images<R: Read + Seek>(
    reader: R,
) -> Result<BTreeMap<String, Vec<EmbeddedImage>>, XlsxError> {
    let mut archive = ZipArchive::new(reader).map_err(|e| XlsxError::Package(e.to_string()))?;

    let workbook_xml = read_part(&mut archive, "xl/workbook.xml")
        .ok_or_else(|| XlsxError::Package("missing xl/workbook.xml".to_string()))?;
    let workbook_rels = read_part(&mut archive, &rels_path("xl/workbook.xml"))
        .map(|xml| parse_relationships(&xml))
        .unwrap_or_default();

    let rid_to_target: HashMap<&str, &str> = workbook_rels
        .iter()
        .map(|rel| (rel.id.as_str(), rel.target.as_str()))
        .collect();

    let mut images = BTreeMap::new();

    for (sheet_name, rid) in parse_sheet_refs(&workbook_xml) {
        let Some(target) = rid_to_target.get(rid.as_str()) else {
            continue;
        };
        let sheet_part = resolve_target("xl/workbook.xml", target);
        let sheet_images = sheet_images(&mut archive, &sheet_name, &sheet_part);
        if !sheet_images.is_empty() {
            tracing::debug!("Sheet '{}': {} embedded images", sheet_name, sheet_images.len());
            images.insert(sheet_name, sheet_images);
        }
    }

    Ok(images)
}

fn sheet_images<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    sheet_name: &str,
    sheet_part: &str,
) -> Vec<EmbeddedImage> {
    let Some(sheet_rels) = read_part(archive, &rels_path(sheet_part)) else {
        return Vec::new();
    };

    let mut images = Vec::new();
    // Ids follow drawing order; skipped blips leave gaps
    let mut blip_index = 0;

    for drawing in parse_relationships(&sheet_rels)
        .into_iter()
        .filter(|rel| rel.kind.ends_with(DRAWING_REL_SUFFIX))
    {
        let drawing_part = resolve_target(sheet_part, &drawing.target);
        let Some(drawing_xml) = read_part(archive, &drawing_part) else {
            tracing::warn!("Sheet '{}': drawing {} not found", sheet_name, drawing_part);
            continue;
        };
        let media_targets: HashMap<String, String> = read_part(archive, &rels_path(&drawing_part))
            .map(|xml| parse_relationships(&xml))
            .unwrap_or_default()
            .into_iter()
            .map(|rel| (rel.id, resolve_target(&drawing_part, &rel.target)))
            .collect();

        for embed_id in parse_blip_embeds(&drawing_xml) {
            let index = blip_index;
            blip_index += 1;
            let Some(media_path) = media_targets.get(&embed_id) else {
                tracing::warn!(
                    "Could not extract image {} from {}: unresolved reference {}",
                    index,
                    sheet_name,
                    embed_id
                );
                continue;
            };
            match read_binary_part(archive, media_path) {
                Some(bytes) => images.push(EmbeddedImage::new(sheet_name, index, media_path.clone(), bytes)),
                None => tracing::warn!(
                    "Could not extract image {} from {}: {} unreadable",
                    index,
                    sheet_name,
                    media_path
                ),
            }
        }
    }

    images
}

/// Read a text part from the archive, returning None on error.
fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Option<String> {
    let mut file = archive.by_name(path).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    Some(content)
}

fn read_binary_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Option<Vec<u8>> {
    let mut file = archive.by_name(path).ok()?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).ok()?;
    Some(bytes)
}

/// `xl/worksheets/sheet1.xml` → `xl/worksheets/_rels/sheet1.xml.rels`
fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the part that owns the rels file.
fn resolve_target(base_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_part.split('/').collect();
    segments.pop(); // owning part's file name

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// `<sheet name=".." r:id=".."/>` entries in workbook order
fn parse_sheet_refs(workbook_xml: &str) -> Vec<(String, String)> {
    let mut refs = Vec::new();
    let mut reader = Reader::from_str(workbook_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"sheet" =>
            {
                let mut name = None;
                let mut rid = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"name" => name = Some(unescape_attr(&attr.value)),
                        b"r:id" => rid = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        _ => {}
                    }
                }
                if let (Some(name), Some(rid)) = (name, rid) {
                    refs.push((name, rid));
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    refs
}

fn parse_relationships(rels_xml: &str) -> Vec<Relationship> {
    let mut rels = Vec::new();
    let mut reader = Reader::from_str(rels_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                let mut kind = String::new();
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"Id" => id = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        b"Target" => target = Some(String::from_utf8_lossy(&attr.value).to_string()),
                        b"Type" => kind = String::from_utf8_lossy(&attr.value).to_string(),
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    rels.push(Relationship { id, target, kind });
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    rels
}

/// Relationship ids of every `<a:blip r:embed="..">` in document order
fn parse_blip_embeds(drawing_xml: &str) -> Vec<String> {
    let mut embeds = Vec::new();
    let mut reader = Reader::from_str(drawing_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"blip" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"embed" {
                        embeds.push(String::from_utf8_lossy(&attr.value).to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    embeds
}

fn unescape_attr(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rels_path() {
        assert_eq!(
            rels_path("xl/worksheets/sheet1.xml"),
            "xl/worksheets/_rels/sheet1.xml.rels"
        );
        assert_eq!(rels_path("xl/workbook.xml"), "xl/_rels/workbook.xml.rels");
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(
            resolve_target("xl/workbook.xml", "worksheets/sheet2.xml"),
            "xl/worksheets/sheet2.xml"
        );
        assert_eq!(
            resolve_target("xl/worksheets/sheet1.xml", "../drawings/drawing1.xml"),
            "xl/drawings/drawing1.xml"
        );
        assert_eq!(
            resolve_target("xl/workbook.xml", "/xl/worksheets/sheet1.xml"),
            "xl/worksheets/sheet1.xml"
        );
    }

    #[test]
    fn test_parse_sheet_refs_keeps_order_and_unescapes() {
        let xml = r#"<workbook xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <sheets>
                <sheet name="PRD &amp; QAS" sheetId="1" r:id="rId1"/>
                <sheet name="DEV" sheetId="2" r:id="rId2"/>
            </sheets>
        </workbook>"#;
        assert_eq!(
            parse_sheet_refs(xml),
            vec![
                ("PRD & QAS".to_string(), "rId1".to_string()),
                ("DEV".to_string(), "rId2".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_relationships() {
        let xml = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
            <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/drawing1.xml"/>
        </Relationships>"#;
        let rels = parse_relationships(xml);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].id, "rId1");
        assert_eq!(rels[0].target, "../drawings/drawing1.xml");
        assert!(rels[0].kind.ends_with(DRAWING_REL_SUFFIX));
    }

    #[test]
    fn test_parse_blip_embeds_in_order() {
        let xml = r#"<xdr:wsDr xmlns:xdr="x" xmlns:a="a" xmlns:r="r">
            <xdr:twoCellAnchor><xdr:pic><xdr:blipFill><a:blip r:embed="rId2"/></xdr:blipFill></xdr:pic></xdr:twoCellAnchor>
            <xdr:twoCellAnchor><xdr:pic><xdr:blipFill><a:blip r:embed="rId1"></a:blip></xdr:blipFill></xdr:pic></xdr:twoCellAnchor>
        </xdr:wsDr>"#;
        assert_eq!(parse_blip_embeds(xml), vec!["rId2", "rId1"]);
    }

    #[test]
    fn test_extract_images_from_package() {
        let dir = tempfile::tempdir().unwrap();
        let path = fixtures::write_sample(dir.path());
        let file = std::fs::File::open(path).unwrap();

        let images = extract_images(file).unwrap();

        assert_eq!(images.keys().collect::<Vec<_>>(), vec!["PRD"]);
        let prd = &images["PRD"];
        assert_eq!(prd.len(), 2);
        assert!(prd[0].media_path.starts_with("xl/media/"));
        assert_eq!(prd[0].bytes, fixtures::PNG_1X1);
    }

    #[test]
    fn test_unreadable_image_keeps_later_ids() {
        use std::io::{Cursor, Write};
        use zip::write::SimpleFileOptions;

        let parts = [
            (
                "xl/worksheets/_rels/sheet1.xml.rels",
                r#"<Relationships><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/drawing1.xml"/></Relationships>"#,
            ),
            (
                "xl/drawings/drawing1.xml",
                r#"<xdr:wsDr xmlns:xdr="x" xmlns:a="a" xmlns:r="r"><a:blip r:embed="rId1"/><a:blip r:embed="rId9"/><a:blip r:embed="rId2"/></xdr:wsDr>"#,
            ),
            (
                "xl/drawings/_rels/drawing1.xml.rels",
                r#"<Relationships><Relationship Id="rId1" Type="image" Target="../media/image1.png"/><Relationship Id="rId2" Type="image" Target="../media/image2.png"/></Relationships>"#,
            ),
        ];

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, xml) in parts {
            writer.start_file(name, SimpleFileOptions::default()).unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
        }
        for name in ["xl/media/image1.png", "xl/media/image2.png"] {
            writer.start_file(name, SimpleFileOptions::default()).unwrap();
            writer.write_all(fixtures::PNG_1X1).unwrap();
        }
        let mut archive = ZipArchive::new(writer.finish().unwrap()).unwrap();

        let images = sheet_images(&mut archive, "PRD", "xl/worksheets/sheet1.xml");

        let ids: Vec<&str> = images.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["PRD_img_0", "PRD_img_2"]);
        assert_eq!(images[1].media_path, "xl/media/image2.png");
    }

    #[test]
    fn test_extract_images_rejects_non_zip() {
        let result = extract_images(std::io::Cursor::new(b"not a zip".to_vec()));
        assert!(matches!(result, Err(XlsxError::Package(_))));
    }
}
