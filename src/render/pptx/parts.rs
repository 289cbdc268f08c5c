//! XML part generators for the PresentationML package.
use crate::error::{Error, Result};
use crate::render::document::{
    Align, ChartKind, ChartSpec, Fill, Paragraph, Rect, SlideSize, TextBlock,
};
use crate::render::theme::Rgb;
use std::fmt::Write as FmtWrite;

pub(crate) const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_C: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";

/// Relationship type URIs
pub(crate) mod rel {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const THEME: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const PRES_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
    pub const VIEW_PROPS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/viewProps";
    pub const TABLE_STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";
    pub const NOTES_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
    pub const IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const CHART: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
}

fn xml_err(e: std::fmt::Error) -> Error {
    Error::render("write xml", e.to_string())
}

/// Drop characters XML 1.0 cannot carry, then escape markup
pub(crate) fn text(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| matches!(c, '\t' | '\n' | '\r') || (*c >= ' ' && *c != '\u{FFFE}' && *c != '\u{FFFF}'))
        .collect();
    quick_xml::escape::escape(&cleaned).into_owned()
}

/// A relationship entry in a `.rels` part
#[derive(Debug, Clone)]
pub(crate) struct Relationship {
    pub id: String,
    pub kind: &'static str,
    pub target: String,
}

impl Relationship {
    pub fn new(id: impl Into<String>, kind: &'static str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            target: target.into(),
        }
    }
}

pub(crate) fn relationships(rels: &[Relationship]) -> Result<String> {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_DECL);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for r in rels {
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            r.id,
            r.kind,
            text(&r.target)
        )
        .map_err(xml_err)?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

/// Package inventory used to build `[Content_Types].xml`
#[derive(Debug, Default)]
pub(crate) struct Inventory {
    pub slides: usize,
    pub notes_slides: Vec<usize>,
    pub charts: usize,
    pub media_types: Vec<(&'static str, &'static str)>,
}

pub(crate) fn content_types(inv: &Inventory) -> Result<String> {
    const PML: &str = "application/vnd.openxmlformats-officedocument.presentationml";
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for (ext, mime) in &inv.media_types {
        write!(xml, r#"<Default Extension="{ext}" ContentType="{mime}"/>"#).map_err(xml_err)?;
    }
    let mut overrides = vec![
        ("/ppt/presentation.xml".to_string(), format!("{PML}.presentation.main+xml")),
        ("/ppt/slideMasters/slideMaster1.xml".to_string(), format!("{PML}.slideMaster+xml")),
        ("/ppt/slideLayouts/slideLayout1.xml".to_string(), format!("{PML}.slideLayout+xml")),
        ("/ppt/theme/theme1.xml".to_string(), "application/vnd.openxmlformats-officedocument.theme+xml".to_string()),
        ("/ppt/presProps.xml".to_string(), format!("{PML}.presProps+xml")),
        ("/ppt/viewProps.xml".to_string(), format!("{PML}.viewProps+xml")),
        ("/ppt/tableStyles.xml".to_string(), format!("{PML}.tableStyles+xml")),
        ("/docProps/core.xml".to_string(), "application/vnd.openxmlformats-package.core-properties+xml".to_string()),
        ("/docProps/app.xml".to_string(), "application/vnd.openxmlformats-officedocument.extended-properties+xml".to_string()),
    ];
    for n in 1..=inv.slides {
        overrides.push((format!("/ppt/slides/slide{n}.xml"), format!("{PML}.slide+xml")));
    }
    if !inv.notes_slides.is_empty() {
        overrides.push(("/ppt/notesMasters/notesMaster1.xml".to_string(), format!("{PML}.notesMaster+xml")));
        overrides.push(("/ppt/theme/theme2.xml".to_string(), "application/vnd.openxmlformats-officedocument.theme+xml".to_string()));
        for n in &inv.notes_slides {
            overrides.push((format!("/ppt/notesSlides/notesSlide{n}.xml"), format!("{PML}.notesSlide+xml")));
        }
    }
    for n in 1..=inv.charts {
        overrides.push((
            format!("/ppt/charts/chart{n}.xml"),
            "application/vnd.openxmlformats-officedocument.drawingml.chart+xml".to_string(),
        ));
    }
    for (part, mime) in overrides {
        write!(xml, r#"<Override PartName="{part}" ContentType="{mime}"/>"#).map_err(xml_err)?;
    }
    xml.push_str("</Types>");
    Ok(xml)
}

pub(crate) fn core_properties(title: &str, created: &str) -> Result<String> {
    let mut xml = String::with_capacity(640);
    xml.push_str(XML_DECL);
    write!(
        xml,
        concat!(
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            r#"<dc:title>{title}</dc:title><dc:creator>AutoPPT</dc:creator>"#,
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{created}</dcterms:created>"#,
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{created}</dcterms:modified>"#,
            r#"</cp:coreProperties>"#
        ),
        title = text(title),
        created = created
    )
    .map_err(xml_err)?;
    Ok(xml)
}

pub(crate) fn app_properties(slides: usize) -> Result<String> {
    let mut xml = String::with_capacity(320);
    xml.push_str(XML_DECL);
    write!(
        xml,
        concat!(
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" "#,
            r#"xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
            r#"<Application>AutoPPT</Application><Slides>{}</Slides></Properties>"#
        ),
        slides
    )
    .map_err(xml_err)?;
    Ok(xml)
}

pub(crate) fn presentation(slide_rel_ids: &[String], notes_master: bool, size: SlideSize) -> Result<String> {
    let mut xml = String::with_capacity(1024 + slide_rel_ids.len() * 48);
    xml.push_str(XML_DECL);
    write!(
        xml,
        r#"<p:presentation xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}" saveSubsetFonts="1">"#
    )
    .map_err(xml_err)?;
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
    if notes_master {
        xml.push_str(r#"<p:notesMasterIdLst><p:notesMasterId r:id="rId6"/></p:notesMasterIdLst>"#);
    }
    if !slide_rel_ids.is_empty() {
        xml.push_str("<p:sldIdLst>");
        for (index, rel_id) in slide_rel_ids.iter().enumerate() {
            write!(xml, r#"<p:sldId id="{}" r:id="{}"/>"#, 256 + index, rel_id).map_err(xml_err)?;
        }
        xml.push_str("</p:sldIdLst>");
    }
    write!(
        xml,
        r#"<p:sldSz cx="{}" cy="{}"/><p:notesSz cx="{}" cy="{}"/>"#,
        size.cx, size.cy, size.cy, size.cx
    )
    .map_err(xml_err)?;
    xml.push_str("</p:presentation>");
    Ok(xml)
}

pub(crate) fn presentation_properties() -> String {
    format!(r#"{XML_DECL}<p:presentationPr xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"/>"#)
}

pub(crate) fn view_properties() -> String {
    format!(r#"{XML_DECL}<p:viewPr xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"/>"#)
}

pub(crate) fn table_styles() -> String {
    format!(r#"{XML_DECL}<a:tblStyleLst xmlns:a="{NS_A}" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#)
}

const EMPTY_GROUP: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

const CLR_MAP: &str = concat!(
    r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
    r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#
);

pub(crate) fn slide_master() -> String {
    format!(
        concat!(
            r#"{decl}<p:sldMaster xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}">"#,
            r#"<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#,
            r#"<p:spTree>{group}</p:spTree></p:cSld>{clr}"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            r#"</p:sldMaster>"#
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        group = EMPTY_GROUP,
        clr = CLR_MAP
    )
}

pub(crate) fn slide_layout() -> String {
    format!(
        concat!(
            r#"{decl}<p:sldLayout xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}" type="blank" preserve="1">"#,
            r#"<p:cSld name="Blank"><p:spTree>{group}</p:spTree></p:cSld>"#,
            r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        group = EMPTY_GROUP
    )
}

pub(crate) fn notes_master() -> String {
    format!(
        concat!(
            r#"{decl}<p:notesMaster xmlns:a="{a}" xmlns:r="{r}" xmlns:p="{p}">"#,
            r#"<p:cSld><p:spTree>{group}</p:spTree></p:cSld>{clr}</p:notesMaster>"#
        ),
        decl = XML_DECL,
        a = NS_A,
        r = NS_R,
        p = NS_P,
        group = EMPTY_GROUP,
        clr = CLR_MAP
    )
}

pub(crate) fn theme() -> String {
    let mut xml = String::with_capacity(3072);
    xml.push_str(XML_DECL);
    xml.push_str(&format!(r#"<a:theme xmlns:a="{NS_A}" name="AutoPPT"><a:themeElements>"#));
    xml.push_str(r#"<a:clrScheme name="AutoPPT">"#);
    xml.push_str(r#"<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>"#);
    xml.push_str(r#"<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>"#);
    for (slot, hex) in [
        ("dk2", "44546A"),
        ("lt2", "E7E6E6"),
        ("accent1", "4472C4"),
        ("accent2", "ED7D31"),
        ("accent3", "A5A5A5"),
        ("accent4", "FFC000"),
        ("accent5", "5B9BD5"),
        ("accent6", "70AD47"),
        ("hlink", "0563C1"),
        ("folHlink", "954F72"),
    ] {
        xml.push_str(&format!(r#"<a:{slot}><a:srgbClr val="{hex}"/></a:{slot}>"#));
    }
    xml.push_str("</a:clrScheme>");
    xml.push_str(concat!(
        r#"<a:fontScheme name="AutoPPT">"#,
        r#"<a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
        r#"<a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>"#,
        r#"</a:fontScheme><a:fmtScheme name="AutoPPT">"#
    ));
    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    xml.push_str(&format!("<a:fillStyleLst>{solid}{solid}{solid}</a:fillStyleLst>"));
    let line = format!(r#"<a:ln w="6350">{solid}</a:ln>"#);
    xml.push_str(&format!("<a:lnStyleLst>{line}{line}{line}</a:lnStyleLst>"));
    let effect = "<a:effectStyle><a:effectLst/></a:effectStyle>";
    xml.push_str(&format!("<a:effectStyleLst>{effect}{effect}{effect}</a:effectStyleLst>"));
    xml.push_str(&format!("<a:bgFillStyleLst>{solid}{solid}{solid}</a:bgFillStyleLst>"));
    xml.push_str("</a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>");
    xml
}

/// Drawing element ready to be placed in a slide's shape tree
#[derive(Debug)]
pub(crate) enum Drawing<'a> {
    Text { frame: Rect, block: &'a TextBlock },
    Picture { frame: Rect, rel_id: String },
    Chart { frame: Rect, rel_id: String },
    Rectangle { frame: Rect, color: Rgb },
}

fn xfrm(xml: &mut String, frame: Rect) -> Result<()> {
    write!(
        xml,
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        frame.x, frame.y, frame.cx, frame.cy
    )
    .map_err(xml_err)
}

fn background(xml: &mut String, fill: &Fill) -> Result<()> {
    xml.push_str("<p:bg><p:bgPr>");
    match fill {
        Fill::Solid { color } => {
            write!(xml, r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, color.hex())
                .map_err(xml_err)?;
        }
        Fill::Gradient { start, end, angle } => {
            // DrawingML angles run clockwise in 60000ths of a degree.
            let clockwise = (360.0 - angle).rem_euclid(360.0);
            write!(
                xml,
                concat!(
                    r#"<a:gradFill rotWithShape="1"><a:gsLst>"#,
                    r#"<a:gs pos="0"><a:srgbClr val="{}"/></a:gs>"#,
                    r#"<a:gs pos="100000"><a:srgbClr val="{}"/></a:gs>"#,
                    r#"</a:gsLst><a:lin ang="{}" scaled="0"/></a:gradFill>"#
                ),
                start.hex(),
                end.hex(),
                (clockwise * 60000.0).round() as i64
            )
            .map_err(xml_err)?;
        }
    }
    xml.push_str("<a:effectLst/></p:bgPr></p:bg>");
    Ok(())
}

fn paragraph(xml: &mut String, para: &Paragraph, line: &str, block: &TextBlock) -> Result<()> {
    let style = &block.style;
    xml.push_str("<a:p>");
    let algn = match block.align {
        Align::Left => "",
        Align::Center => r#" algn="ctr""#,
    };
    if para.bullet {
        let (mar, indent) = match para.level {
            0 => (342_900, -342_900),
            _ => (685_800, -228_600),
        };
        let glyph = if para.level == 0 { "•" } else { "◦" };
        write!(
            xml,
            r#"<a:pPr lvl="{}" marL="{}" indent="{}"{}><a:buFont typeface="Arial"/><a:buChar char="{}"/></a:pPr>"#,
            para.level.min(8),
            mar,
            indent,
            algn,
            glyph
        )
        .map_err(xml_err)?;
    } else {
        write!(xml, r#"<a:pPr{}><a:buNone/></a:pPr>"#, algn).map_err(xml_err)?;
    }
    if !line.is_empty() {
        write!(
            xml,
            concat!(
                r#"<a:r><a:rPr lang="en-US" sz="{}" b="{}" dirty="0">"#,
                r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
                r#"<a:latin typeface="{font}"/><a:cs typeface="{font}"/></a:rPr>"#,
                r#"<a:t>{}</a:t></a:r>"#
            ),
            (style.size_pt * 100.0).round() as i64,
            if style.bold { 1 } else { 0 },
            style.color.hex(),
            text(line),
            font = text(&style.font)
        )
        .map_err(xml_err)?;
    }
    xml.push_str("</a:p>");
    Ok(())
}

fn text_box(xml: &mut String, id: u32, frame: Rect, block: &TextBlock) -> Result<()> {
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>"#
    )
    .map_err(xml_err)?;
    xfrm(xml, frame)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody>"#);
    let wrap = if block.wrap { "square" } else { "none" };
    write!(xml, r#"<a:bodyPr wrap="{wrap}" rtlCol="0"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#)
        .map_err(xml_err)?;
    let mut wrote = false;
    for para in &block.paragraphs {
        for line in para.text.split('\n') {
            paragraph(xml, para, line.trim_end_matches('\r'), block)?;
            wrote = true;
        }
    }
    if !wrote {
        xml.push_str("<a:p/>");
    }
    xml.push_str("</p:txBody></p:sp>");
    Ok(())
}

fn picture(xml: &mut String, id: u32, frame: Rect, rel_id: &str) -> Result<()> {
    write!(
        xml,
        concat!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/>"#,
            r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#,
            r#"<p:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>"#
        ),
        id = id,
        rel = rel_id
    )
    .map_err(xml_err)?;
    xfrm(xml, frame)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
    Ok(())
}

fn chart_frame(xml: &mut String, id: u32, frame: Rect, rel_id: &str) -> Result<()> {
    write!(
        xml,
        concat!(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Chart {id}"/>"#,
            r#"<p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr>"#,
            r#"<p:xfrm><a:off x="{x}" y="{y}"/><a:ext cx="{cx}" cy="{cy}"/></p:xfrm>"#,
            r#"<a:graphic><a:graphicData uri="{c}"><c:chart xmlns:c="{c}" r:id="{rel}"/></a:graphicData></a:graphic>"#,
            r#"</p:graphicFrame>"#
        ),
        id = id,
        x = frame.x,
        y = frame.y,
        cx = frame.cx,
        cy = frame.cy,
        c = NS_C,
        rel = rel_id
    )
    .map_err(xml_err)
}

fn rectangle(xml: &mut String, id: u32, frame: Rect, color: Rgb) -> Result<()> {
    write!(
        xml,
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Rectangle {id}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>"#
    )
    .map_err(xml_err)?;
    xfrm(xml, frame)?;
    write!(
        xml,
        r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:ln><a:noFill/></a:ln></p:spPr></p:sp>"#,
        color.hex()
    )
    .map_err(xml_err)
}

pub(crate) fn slide(name: &str, fill: Option<&Fill>, drawings: &[Drawing<'_>]) -> Result<String> {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    write!(
        xml,
        r#"<p:sld xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld name="{}">"#,
        text(name)
    )
    .map_err(xml_err)?;
    if let Some(fill) = fill {
        background(&mut xml, fill)?;
    }
    xml.push_str("<p:spTree>");
    xml.push_str(EMPTY_GROUP);
    // Id 1 is the group itself.
    for (offset, drawing) in drawings.iter().enumerate() {
        let id = 2 + offset as u32;
        match drawing {
            Drawing::Text { frame, block } => text_box(&mut xml, id, *frame, block)?,
            Drawing::Picture { frame, rel_id } => picture(&mut xml, id, *frame, rel_id)?,
            Drawing::Chart { frame, rel_id } => chart_frame(&mut xml, id, *frame, rel_id)?,
            Drawing::Rectangle { frame, color } => rectangle(&mut xml, id, *frame, *color)?,
        }
    }
    xml.push_str("</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
    Ok(xml)
}

pub(crate) fn notes_slide(notes: &str) -> Result<String> {
    let mut xml = String::with_capacity(1024 + notes.len());
    xml.push_str(XML_DECL);
    write!(xml, r#"<p:notes xmlns:a="{NS_A}" xmlns:r="{NS_R}" xmlns:p="{NS_P}"><p:cSld><p:spTree>"#)
        .map_err(xml_err)?;
    xml.push_str(EMPTY_GROUP);
    xml.push_str(concat!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Notes Placeholder 1"/>"#,
        r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr>"#,
        r#"<p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>"#
    ));
    for line in notes.lines() {
        if line.trim().is_empty() {
            xml.push_str("<a:p/>");
        } else {
            write!(xml, r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#, text(line))
                .map_err(xml_err)?;
        }
    }
    if notes.lines().next().is_none() {
        xml.push_str("<a:p/>");
    }
    xml.push_str("</p:txBody></p:sp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:notes>");
    Ok(xml)
}

fn series(xml: &mut String, chart: &ChartSpec) -> Result<()> {
    write!(
        xml,
        r#"<c:ser><c:idx val="0"/><c:order val="0"/><c:tx><c:v>{}</c:v></c:tx>"#,
        text(&chart.series_name)
    )
    .map_err(xml_err)?;
    if chart.kind == ChartKind::Line {
        xml.push_str(r#"<c:marker><c:symbol val="circle"/></c:marker>"#);
    }
    write!(xml, r#"<c:cat><c:strLit><c:ptCount val="{}"/>"#, chart.categories.len()).map_err(xml_err)?;
    for (idx, category) in chart.categories.iter().enumerate() {
        write!(xml, r#"<c:pt idx="{}"><c:v>{}</c:v></c:pt>"#, idx, text(category)).map_err(xml_err)?;
    }
    write!(
        xml,
        r#"</c:strLit></c:cat><c:val><c:numLit><c:formatCode>General</c:formatCode><c:ptCount val="{}"/>"#,
        chart.values.len()
    )
    .map_err(xml_err)?;
    for (idx, value) in chart.values.iter().enumerate() {
        write!(xml, r#"<c:pt idx="{}"><c:v>{}</c:v></c:pt>"#, idx, value).map_err(xml_err)?;
    }
    xml.push_str("</c:numLit></c:val>");
    if chart.kind == ChartKind::Line {
        xml.push_str(r#"<c:smooth val="0"/>"#);
    }
    xml.push_str("</c:ser>");
    Ok(())
}

fn axes(xml: &mut String, horizontal_bars: bool) {
    let (cat_pos, val_pos) = if horizontal_bars { ("l", "b") } else { ("b", "l") };
    xml.push_str(&format!(
        concat!(
            r#"<c:catAx><c:axId val="1001"/><c:scaling><c:orientation val="minMax"/></c:scaling>"#,
            r#"<c:delete val="0"/><c:axPos val="{cat}"/><c:numFmt formatCode="General" sourceLinked="0"/>"#,
            r#"<c:majorTickMark val="out"/><c:minorTickMark val="none"/><c:tickLblPos val="nextTo"/>"#,
            r#"<c:crossAx val="1002"/><c:crosses val="autoZero"/><c:auto val="1"/>"#,
            r#"<c:lblAlgn val="ctr"/><c:lblOffset val="100"/></c:catAx>"#,
            r#"<c:valAx><c:axId val="1002"/><c:scaling><c:orientation val="minMax"/></c:scaling>"#,
            r#"<c:delete val="0"/><c:axPos val="{val}"/><c:majorGridlines/>"#,
            r#"<c:numFmt formatCode="General" sourceLinked="0"/><c:majorTickMark val="out"/>"#,
            r#"<c:minorTickMark val="none"/><c:tickLblPos val="nextTo"/><c:crossAx val="1001"/>"#,
            r#"<c:crosses val="autoZero"/><c:crossBetween val="between"/></c:valAx>"#
        ),
        cat = cat_pos,
        val = val_pos
    ));
}

pub(crate) fn chart(chart: &ChartSpec) -> Result<String> {
    let mut xml = String::with_capacity(2048 + chart.categories.len() * 64);
    xml.push_str(XML_DECL);
    write!(
        xml,
        r#"<c:chartSpace xmlns:c="{NS_C}" xmlns:a="{NS_A}" xmlns:r="{NS_R}"><c:roundedCorners val="0"/><c:chart>"#
    )
    .map_err(xml_err)?;
    write!(
        xml,
        concat!(
            r#"<c:title><c:tx><c:rich><a:bodyPr/><a:lstStyle/><a:p><a:r><a:t>{}</a:t></a:r></a:p></c:rich></c:tx>"#,
            r#"<c:overlay val="0"/></c:title><c:autoTitleDeleted val="0"/><c:plotArea><c:layout/>"#
        ),
        text(&chart.title)
    )
    .map_err(xml_err)?;
    match chart.kind {
        ChartKind::BarClustered | ChartKind::ColumnClustered => {
            let dir = if chart.kind == ChartKind::BarClustered { "bar" } else { "col" };
            write!(
                xml,
                r#"<c:barChart><c:barDir val="{dir}"/><c:grouping val="clustered"/><c:varyColors val="0"/>"#
            )
            .map_err(xml_err)?;
            series(&mut xml, chart)?;
            xml.push_str(r#"<c:gapWidth val="150"/><c:axId val="1001"/><c:axId val="1002"/></c:barChart>"#);
            axes(&mut xml, chart.kind == ChartKind::BarClustered);
        }
        ChartKind::Line => {
            xml.push_str(r#"<c:lineChart><c:grouping val="standard"/><c:varyColors val="0"/>"#);
            series(&mut xml, chart)?;
            xml.push_str(r#"<c:marker val="1"/><c:axId val="1001"/><c:axId val="1002"/></c:lineChart>"#);
            axes(&mut xml, false);
        }
        ChartKind::Pie => {
            xml.push_str(r#"<c:pieChart><c:varyColors val="1"/>"#);
            series(&mut xml, chart)?;
            xml.push_str(r#"<c:firstSliceAng val="0"/></c:pieChart>"#);
        }
    }
    xml.push_str("</c:plotArea>");
    if chart.kind == ChartKind::Pie {
        xml.push_str(r#"<c:legend><c:legendPos val="r"/><c:overlay val="0"/></c:legend>"#);
    }
    xml.push_str(r#"<c:plotVisOnly val="1"/></c:chart></c:chartSpace>"#);
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_escapes_and_strips_controls() {
        assert_eq!(text("R&D <2024>"), "R&amp;D &lt;2024&gt;");
        assert_eq!(text("bad\u{0007}char"), "badchar");
    }

    #[test]
    fn test_gradient_angle_maps_to_top_down() {
        let mut xml = String::new();
        background(
            &mut xml,
            &Fill::Gradient {
                start: Rgb(10, 10, 40),
                end: Rgb(30, 30, 80),
                angle: 270.0,
            },
        )
        .unwrap();
        assert!(xml.contains(r#"<a:lin ang="5400000""#));
        assert!(xml.contains("0A0A28"));
    }

    #[test]
    fn test_horizontal_bar_chart() {
        let xml = chart(&ChartSpec {
            kind: ChartKind::BarClustered,
            title: "Adoption".to_string(),
            categories: vec!["2022".to_string(), "2023".to_string()],
            series_name: "Series 1".to_string(),
            values: vec![12.5, 30.0],
        })
        .unwrap();
        assert!(xml.contains(r#"<c:barDir val="bar"/>"#));
        assert!(xml.contains(r#"<c:ptCount val="2"/>"#));
        assert!(xml.contains("<c:v>12.5</c:v>"));
    }

    #[test]
    fn test_pie_chart_has_no_axes() {
        let xml = chart(&ChartSpec {
            kind: ChartKind::Pie,
            title: "Share".to_string(),
            categories: vec!["A".to_string()],
            series_name: "Series 1".to_string(),
            values: vec![1.0],
        })
        .unwrap();
        assert!(xml.contains("<c:pieChart>"));
        assert!(!xml.contains("<c:catAx>"));
    }
}
