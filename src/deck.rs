// ABOUTME: Slide rendering module for the quickdeck application
// ABOUTME: Lays text and images onto OOXML slides and writes the PPTX package

use crate::errors::{DeckError, Result};
use crate::images::{ImageAsset, ImageKind};
use crate::utils::{strip_bullet_marker, truncate_at_boundary};
use image::GenericImageView;
use log::info;
use quick_xml::escape::escape;
use std::fs;
use std::io::Write;
use std::path::Path;
use zip::{ZipWriter, write::FileOptions};

const EMU_PER_INCH: f64 = 914_400.0;
const EMU_PER_PT: f64 = 12_700.0;

// 4:3 canvas, 10" x 7.5"
const SLIDE_CX: i64 = 9_144_000;
const SLIDE_CY: i64 = 6_858_000;

/// Maximum character budget for the title-slide body paragraph.
pub const SUBTITLE_MAX_CHARS: usize = 310;
/// Minimum offset for a sentence-boundary cut within the budget.
pub const SUBTITLE_MIN_BREAK: usize = 120;

fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH).round() as i64
}

fn points(value: f64) -> i64 {
    (value * EMU_PER_PT).round() as i64
}

/// Title font size in points, stepping down across four tiers as the title
/// length crosses the 35/55/70 character thresholds.
pub fn title_font_pt(title: &str) -> u32 {
    let len = title.chars().count();
    if len > 70 {
        34
    } else if len > 55 {
        38
    } else if len > 35 {
        42
    } else {
        46
    }
}

struct ParagraphStyle {
    size_pt: u32,
    bold: bool,
    centered: bool,
    line_spacing_pct: Option<u32>,
    space_after_pt: Option<u32>,
}

impl ParagraphStyle {
    fn plain(size_pt: u32) -> Self {
        Self {
            size_pt,
            bold: false,
            centered: false,
            line_spacing_pct: None,
            space_after_pt: None,
        }
    }
}

fn paragraph_xml(text: &str, style: &ParagraphStyle) -> String {
    let mut props = String::new();
    if let Some(pct) = style.line_spacing_pct {
        props.push_str(&format!(
            r#"<a:lnSpc><a:spcPct val="{}"/></a:lnSpc>"#,
            pct * 1000
        ));
    }
    if let Some(pt) = style.space_after_pt {
        props.push_str(&format!(
            r#"<a:spcAft><a:spcPts val="{}"/></a:spcAft>"#,
            pt * 100
        ));
    }

    let align = if style.centered { r#" algn="ctr""# } else { "" };
    let bold = if style.bold { r#" b="1""# } else { "" };

    format!(
        r#"<a:p><a:pPr{align}>{props}</a:pPr><a:r><a:rPr lang="en-US" sz="{size}"{bold} dirty="0"/><a:t>{text}</a:t></a:r></a:p>"#,
        align = align,
        props = props,
        size = style.size_pt * 100,
        bold = bold,
        text = escape(text)
    )
}

fn text_shape(
    id: u32,
    name: &str,
    x: i64,
    y: i64,
    cx: i64,
    cy: i64,
    anchor_middle: bool,
    paragraphs: &str,
) -> String {
    let anchor = if anchor_middle { r#" anchor="ctr""# } else { "" };
    format!(
        r#"<p:sp>
    <p:nvSpPr>
        <p:cNvPr id="{id}" name="{name}"/>
        <p:cNvSpPr txBox="1"/>
        <p:nvPr/>
    </p:nvSpPr>
    <p:spPr>
        <a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>
        <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
        <a:noFill/>
    </p:spPr>
    <p:txBody>
        <a:bodyPr wrap="square"{anchor}/>
        <a:lstStyle/>
        {paragraphs}
    </p:txBody>
</p:sp>"#
    )
}

/// Thin decorative rule used beneath the title on the title slide.
fn rule_shape(id: u32, x: i64, y: i64, cx: i64, cy: i64) -> String {
    format!(
        r#"<p:sp>
    <p:nvSpPr>
        <p:cNvPr id="{id}" name="Rule"/>
        <p:cNvSpPr/>
        <p:nvPr/>
    </p:nvSpPr>
    <p:spPr>
        <a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>
        <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
        <a:noFill/>
        <a:ln w="19050"><a:solidFill><a:srgbClr val="404040"/></a:solidFill></a:ln>
    </p:spPr>
    <p:txBody><a:bodyPr/><a:lstStyle/><a:p/></p:txBody>
</p:sp>"#
    )
}

fn picture_shape(id: u32, x: i64, y: i64, cx: i64, cy: i64) -> String {
    format!(
        r#"<p:pic>
    <p:nvPicPr>
        <p:cNvPr id="{id}" name="Image"/>
        <p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr>
        <p:nvPr/>
    </p:nvPicPr>
    <p:blipFill>
        <a:blip r:embed="rId1"/>
        <a:stretch><a:fillRect/></a:stretch>
    </p:blipFill>
    <p:spPr>
        <a:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>
        <a:prstGeom prst="rect"><a:avLst/></a:prstGeom>
    </p:spPr>
</p:pic>"#
    )
}

fn slide_xml(shapes: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:cSld>
        <p:spTree>
            <p:nvGrpSpPr>
                <p:cNvPr id="1" name=""/>
                <p:cNvGrpSpPr/>
                <p:nvPr/>
            </p:nvGrpSpPr>
            <p:grpSpPr>
                <a:xfrm>
                    <a:off x="0" y="0"/>
                    <a:ext cx="0" cy="0"/>
                    <a:chOff x="0" y="0"/>
                    <a:chExt cx="0" cy="0"/>
                </a:xfrm>
            </p:grpSpPr>
            {shapes}
        </p:spTree>
    </p:cSld>
    <p:clrMapOvr>
        <a:masterClrMapping/>
    </p:clrMapOvr>
</p:sld>"#
    )
}

fn bullet_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(strip_bullet_marker)
        .filter(|line| !line.is_empty())
        .map(|line| format!("• {}", line))
        .collect()
}

struct SlideEntry {
    xml: String,
    media: Option<(ImageKind, Vec<u8>)>,
}

/// An in-progress presentation. Slides accumulate in order; `save` writes
/// the whole OOXML package in one pass.
pub struct Deck {
    title: String,
    slides: Vec<SlideEntry>,
}

impl Deck {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slides: Vec::new(),
        }
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Centered title with a decorative rule and a single flattened body
    /// paragraph below it, truncated to the subtitle budget.
    pub fn add_title_slide(&mut self, title: &str, subtitle: &str) {
        let mut shapes = String::new();

        let title_para = paragraph_xml(
            title,
            &ParagraphStyle {
                size_pt: title_font_pt(title),
                bold: true,
                centered: true,
                line_spacing_pct: None,
                space_after_pt: None,
            },
        );
        shapes.push_str(&text_shape(
            2,
            "Title",
            inches(0.6),
            inches(0.9),
            inches(9.2),
            inches(1.8),
            true,
            &title_para,
        ));

        shapes.push_str(&rule_shape(
            3,
            inches(1.2),
            inches(2.25),
            inches(7.6),
            points(0.5),
        ));

        let body = subtitle.replace('•', " ").trim().to_string();
        if !body.is_empty() {
            let body = truncate_at_boundary(&body, SUBTITLE_MAX_CHARS, SUBTITLE_MIN_BREAK);
            let subtitle_para = paragraph_xml(
                &body,
                &ParagraphStyle {
                    size_pt: 19,
                    bold: false,
                    centered: true,
                    line_spacing_pct: None,
                    space_after_pt: None,
                },
            );
            shapes.push_str(&text_shape(
                4,
                "Subtitle",
                inches(1.0),
                inches(2.9),
                inches(8.2),
                inches(3.0),
                false,
                &subtitle_para,
            ));
        }

        self.slides.push(SlideEntry {
            xml: slide_xml(&shapes),
            media: None,
        });
    }

    /// Title plus a bulleted list, one paragraph per non-empty input line.
    /// The first content slide gets slightly larger text and spacing; this is
    /// a fixed visual-hierarchy policy, not content-dependent.
    pub fn add_content_slide(&mut self, title: &str, content: &str, first: bool) {
        let mut shapes = String::new();

        let title_para = paragraph_xml(
            title,
            &ParagraphStyle {
                size_pt: if first { 28 } else { 26 },
                bold: true,
                centered: false,
                line_spacing_pct: None,
                space_after_pt: None,
            },
        );
        shapes.push_str(&text_shape(
            2,
            "Title",
            inches(0.5),
            inches(0.4),
            inches(9.0),
            inches(if first { 1.1 } else { 0.9 }),
            false,
            &title_para,
        ));

        let body_style = ParagraphStyle {
            size_pt: if first { 21 } else { 20 },
            bold: false,
            centered: false,
            line_spacing_pct: Some(if first { 135 } else { 115 }),
            space_after_pt: Some(if first { 10 } else { 6 }),
        };
        let paragraphs: String = bullet_lines(content)
            .iter()
            .map(|line| paragraph_xml(line, &body_style))
            .collect();
        shapes.push_str(&text_shape(
            3,
            "Content",
            inches(0.7),
            inches(1.6),
            inches(8.6),
            inches(if first { 5.2 } else { 4.8 }),
            false,
            &paragraphs,
        ));

        self.slides.push(SlideEntry {
            xml: slide_xml(&shapes),
            media: None,
        });
    }

    /// Title, a narrower bulleted list on the left, and the image aspect-fit
    /// into a 4" x 4" box beside the text. Failures return a render error so
    /// the caller can fall back to the content-slide layout.
    pub fn add_image_slide(&mut self, title: &str, content: &str, asset: &ImageAsset) -> Result<()> {
        let decoded = image::load_from_memory(&asset.bytes)
            .map_err(|e| DeckError::RenderError(format!("Image failed to decode: {}", e)))?;
        let (img_w, img_h) = (decoded.width(), decoded.height());
        if img_w == 0 || img_h == 0 {
            return Err(DeckError::RenderError("Image has zero dimensions".to_string()));
        }

        // Aspect-fit: scale by width for landscape, by height for portrait
        let aspect = img_w as f64 / img_h as f64;
        let (width, height) = if aspect >= 1.0 {
            (inches(4.0), (inches(4.0) as f64 / aspect).round() as i64)
        } else {
            ((inches(4.0) as f64 * aspect).round() as i64, inches(4.0))
        };

        let mut shapes = String::new();

        let title_para = paragraph_xml(
            title,
            &ParagraphStyle {
                size_pt: 28,
                bold: true,
                centered: false,
                line_spacing_pct: None,
                space_after_pt: None,
            },
        );
        shapes.push_str(&text_shape(
            2,
            "Title",
            inches(0.4),
            inches(0.3),
            inches(9.0),
            inches(0.8),
            false,
            &title_para,
        ));

        let body_style = ParagraphStyle::plain(16);
        let paragraphs: String = bullet_lines(content)
            .iter()
            .map(|line| paragraph_xml(line, &body_style))
            .collect();
        shapes.push_str(&text_shape(
            3,
            "Content",
            inches(0.4),
            inches(1.2),
            inches(4.2),
            inches(4.5),
            false,
            &paragraphs,
        ));

        shapes.push_str(&picture_shape(4, inches(5.4), inches(1.2), width, height));

        self.slides.push(SlideEntry {
            xml: slide_xml(&shapes),
            media: Some((asset.kind, asset.bytes.clone())),
        });
        Ok(())
    }

    /// Write the full OOXML package to disk.
    pub fn save(&self, output_file: &Path) -> Result<()> {
        info!("Writing PPTX with {} slides to {:?}", self.slides.len(), output_file);

        if let Some(parent) = output_file.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(DeckError::FileReadError)?;
            }
        }

        let file = fs::File::create(output_file)
            .map_err(|e| DeckError::PersistenceError(format!("Failed to create file: {}", e)))?;
        let mut zip = ZipWriter::new(file);

        self.write_content_types(&mut zip)?;
        self.write_package_rels(&mut zip)?;
        self.write_doc_props(&mut zip)?;
        self.write_presentation(&mut zip)?;
        self.write_slides(&mut zip)?;

        zip.finish()?;
        info!("PPTX file created at {:?}", output_file);
        Ok(())
    }

    fn write_content_types(&self, zip: &mut ZipWriter<fs::File>) -> Result<()> {
        zip.start_file("[Content_Types].xml", FileOptions::default())?;
        let content_types = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="xml" ContentType="application/xml"/>
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="jpeg" ContentType="image/jpeg"/>
    <Default Extension="jpg" ContentType="image/jpeg"/>
    <Default Extension="png" ContentType="image/png"/>
    <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
    <Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>
    <Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>
    {slides}
</Types>"#,
            slides = (1..=self.slides.len())
                .map(|i| format!(
                    r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                    i
                ))
                .collect::<Vec<String>>()
                .join("\n    ")
        );
        zip.write_all(content_types.as_bytes())?;
        Ok(())
    }

    fn write_package_rels(&self, zip: &mut ZipWriter<fs::File>) -> Result<()> {
        zip.start_file("_rels/.rels", FileOptions::default())?;
        let rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>
    <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/>
</Relationships>"#;
        zip.write_all(rels.as_bytes())?;
        Ok(())
    }

    fn write_doc_props(&self, zip: &mut ZipWriter<fs::File>) -> Result<()> {
        zip.start_file("docProps/app.xml", FileOptions::default())?;
        let app_xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
    <Application>quickdeck</Application>
    <Slides>{}</Slides>
</Properties>"#,
            self.slides.len()
        );
        zip.write_all(app_xml.as_bytes())?;

        zip.start_file("docProps/core.xml", FileOptions::default())?;
        let core_xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
    <dc:title>{}</dc:title>
    <dc:creator>quickdeck</dc:creator>
    <dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>
    <cp:revision>1</cp:revision>
</cp:coreProperties>"#,
            escape(&self.title),
            chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
        );
        zip.write_all(core_xml.as_bytes())?;
        Ok(())
    }

    fn write_presentation(&self, zip: &mut ZipWriter<fs::File>) -> Result<()> {
        zip.start_file("ppt/_rels/presentation.xml.rels", FileOptions::default())?;
        let mut pres_rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
        );
        for i in 1..=self.slides.len() {
            pres_rels.push_str(&format!(
                r#"    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
                i, i
            ));
            pres_rels.push('\n');
        }
        pres_rels.push_str("</Relationships>");
        zip.write_all(pres_rels.as_bytes())?;

        zip.start_file("ppt/presentation.xml", FileOptions::default())?;
        let presentation_xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
    <p:sldIdLst>
{slide_ids}
    </p:sldIdLst>
    <p:sldSz cx="{cx}" cy="{cy}" type="screen4x3"/>
    <p:notesSz cx="6858000" cy="9144000"/>
</p:presentation>"#,
            slide_ids = (0..self.slides.len())
                .map(|i| format!(r#"        <p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 1))
                .collect::<Vec<String>>()
                .join("\n"),
            cx = SLIDE_CX,
            cy = SLIDE_CY
        );
        zip.write_all(presentation_xml.as_bytes())?;
        Ok(())
    }

    fn write_slides(&self, zip: &mut ZipWriter<fs::File>) -> Result<()> {
        for (i, slide) in self.slides.iter().enumerate() {
            let slide_num = i + 1;

            if let Some((kind, bytes)) = &slide.media {
                let image_name = format!("image{}.{}", slide_num, kind.extension());
                zip.start_file(format!("ppt/media/{}", image_name), FileOptions::default())?;
                zip.write_all(bytes)?;

                zip.start_file(
                    format!("ppt/slides/_rels/slide{}.xml.rels", slide_num),
                    FileOptions::default(),
                )?;
                let slide_rels = format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/{}"/>
</Relationships>"#,
                    image_name
                );
                zip.write_all(slide_rels.as_bytes())?;
            }

            zip.start_file(
                format!("ppt/slides/slide{}.xml", slide_num),
                FileOptions::default(),
            )?;
            zip.write_all(slide.xml.as_bytes())?;
        }
        Ok(())
    }
}
