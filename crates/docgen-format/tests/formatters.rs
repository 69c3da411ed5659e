use docgen_format::{CanonicalFormatter, FormatError, FormatOptions, MarkdownFormatter};
use pretty_assertions::assert_eq;

const GENERATED: &str = "#   Button ##\nIntro line.  \nSecond line.\n\n\n* one\n+ two\n\n```js\n*  keep   \n```\n";

fn format(formatter: &dyn MarkdownFormatter, text: &str) -> String {
    formatter
        .format(text, &FormatOptions::markdown())
        .expect("format")
}

#[test]
fn canonical_formatter_cleans_generated_documentation() {
    let formatted = format(&CanonicalFormatter, GENERATED);

    assert_eq!(
        formatted,
        "# Button\n\nIntro line.  \nSecond line.\n\n- one\n- two\n\n```js\n*  keep   \n```\n"
    );
}

#[test]
fn canonical_output_is_stable() {
    let once = format(&CanonicalFormatter, GENERATED);
    let twice = format(&CanonicalFormatter, &once);
    assert_eq!(once, twice);
}

#[test]
fn closures_can_stand_in_for_a_formatter() {
    let shout = |text: &str, options: &FormatOptions| {
        assert_eq!(options.parser.as_str(), "markdown");
        Ok::<_, FormatError>(text.to_uppercase())
    };

    assert_eq!(format(&shout, "# title\n"), "# TITLE\n");
}
