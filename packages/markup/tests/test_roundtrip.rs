use marginalia_markup::{parse, parse_fragment, serialize, serialize_nodes, Node, ParseError};

const LETTER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<?xml-model href="tei_all.rng" type="application/xml"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader>
    <fileDesc><titleStmt><title>Letter</title></titleStmt></fileDesc>
  </teiHeader>
  <text>
    <body>
      <div xml:id="f1r" type="page">
        <p>Dear <persName>Anna</persName>,</p>
        <p>I arrived in <placeName>Genoa</placeName> on the <hi rend="sup">3rd</hi>.</p>
      </div>
      <div type="page">
        <p><suggestion mode="addition" type="persName" reason="Proper name">Marco</suggestion> sends regards.</p>
      </div>
    </body>
  </text>
</TEI>
"#;

#[test]
fn test_letter_roundtrip() {
    let doc = parse(LETTER).unwrap();
    let exported = serialize(&doc);
    let reparsed = parse(&exported).unwrap();

    assert_eq!(doc, reparsed);
    assert_eq!(exported, serialize(&reparsed));
}

#[test]
fn test_letter_structure() {
    let doc = parse(LETTER).unwrap();

    assert_eq!(doc.prolog.len(), 2);
    assert_eq!(doc.root.local_name(), "TEI");
    assert_eq!(
        doc.root.attribute("xmlns"),
        Some("http://www.tei-c.org/ns/1.0")
    );

    let divs: Vec<_> = doc
        .root
        .descendants()
        .filter(|e| e.local_name() == "div")
        .collect();
    assert_eq!(divs.len(), 2);
    assert_eq!(divs[0].attribute("xml:id"), Some("f1r"));
}

#[test]
fn test_fragment_roundtrip() {
    let fragment = r#"On <date when="1890-05-03">3 May</date> <persName>Marco</persName> wrote &amp; left."#;
    let nodes = parse_fragment(fragment).unwrap();

    assert_eq!(serialize_nodes(&nodes), fragment);
}

#[test]
fn test_unparsable_fragment_reports_error() {
    let err = parse_fragment("<persName>Marco</placeName>").unwrap_err();
    assert!(matches!(err, ParseError::MismatchedTag { .. }));
    assert!(err.span().is_some());
}

#[test]
fn test_node_json_shape() {
    let nodes = parse_fragment("a<b/>").unwrap();
    let json = serde_json::to_value(&nodes).unwrap();

    assert_eq!(json[0]["type"], "text");
    assert_eq!(json[0]["value"], "a");
    assert_eq!(json[1]["type"], "element");
    assert_eq!(json[1]["value"]["name"], "b");

    let back: Vec<Node> = serde_json::from_value(json).unwrap();
    assert_eq!(back, nodes);
}

/// parse → serialize → parse must give back an equal document, and the
/// second serialization must be byte-identical to the first
fn assert_stable(source: &str) {
    let doc = parse(source).unwrap_or_else(|err| panic!("{:?} in {}", err, source));
    let exported = serialize(&doc);
    let reparsed = parse(&exported).unwrap_or_else(|err| panic!("{:?} in {}", err, exported));

    assert_eq!(doc, reparsed, "tree changed for {}", source);
    assert_eq!(exported, serialize(&reparsed), "output changed for {}", source);
}

#[test]
fn test_roundtrip_comments_and_instructions() {
    assert_stable("<!-- before --><?pi   spaced   data?><TEI><!--in - body--><?empty?></TEI><!-- after -->");
    assert_stable("<TEI><p><?note ok??>text<!---->more</p></TEI>");
}

#[test]
fn test_roundtrip_cdata_becomes_text() {
    let source = "<p>x <![CDATA[<b> & ]]]> y</p>";
    let doc = parse(source).unwrap();

    assert_eq!(doc.root.children, vec![Node::text("x <b> & ] y")]);
    assert_eq!(serialize(&doc), "<p>x &lt;b&gt; &amp; ] y</p>");
    assert_stable(source);
}

#[test]
fn test_roundtrip_escaped_attributes() {
    let source = concat!(
        r#"<p a="&lt;&amp;&quot;&apos;&#x41;&#10;&#9;" b='say "hi"' c="x > y">"#,
        r#"a ]]&gt; b &#233;</p>"#,
    );
    let doc = parse(source).unwrap();

    assert_eq!(doc.root.attribute("a"), Some("<&\"'A\n\t"));
    assert_eq!(doc.root.attribute("b"), Some(r#"say "hi""#));
    assert_eq!(doc.root.attribute("c"), Some("x > y"));
    assert_eq!(doc.root.text_content(), "a ]]> b é");
    assert_stable(source);
}

#[test]
fn test_roundtrip_doctype_and_whitespace() {
    assert_stable("<!DOCTYPE TEI>\n<TEI>\n  <text>\n\t<p> spaced  out </p>\n  </text>\n</TEI>\n");
    assert_stable("<a><b/><c></c><d x=''/></a>");
}

#[test]
fn test_roundtrip_byte_order_mark() {
    let doc = parse("\u{FEFF}<?xml version=\"1.0\"?>\n<TEI><p>Anna</p></TEI>").unwrap();
    let exported = serialize(&doc);

    assert!(!exported.starts_with('\u{FEFF}'));
    assert_eq!(parse(&exported).unwrap(), doc);
}
