//! Keyword expansion behaviour, table-driven.

use logdog_template::{Expander, FixedHostname};
use rstest::{fixture, rstest};

#[fixture]
fn expander() -> Expander {
    Expander::with_resolver(FixedHostname::new("box.example.com")).expect("expander")
}

// ---------------------------------------------------------------------------
// Token forms
// ---------------------------------------------------------------------------

#[rstest]
#[case("$HOSTNAME", "box.example.com")]
#[case("${HOSTNAME}", "box.example.com")]
#[case("$hostname", "box.example.com")]
#[case("${HostName}", "box.example.com")]
#[case("a ${hostname}b", "a box.example.comb")]
#[case("$HOSTNAME and $HOSTNAME", "box.example.com and box.example.com")]
#[case("$HOSTNAMEX", "$HOSTNAMEX")]
#[case("$HOST", "$HOST")]
#[case("$PATH ${UNKNOWN}", "$PATH ${UNKNOWN}")]
#[case("${HOSTNAME", "${HOSTNAME")]
fn token_forms(expander: Expander, #[case] template: &str, #[case] expected: &str) {
    assert_eq!(expander.expand(template, "", "", ""), expected);
}

#[rstest]
#[case("")]
#[case("nothing to see here")]
#[case("costs $5 and 10$")]
fn templates_without_keywords_are_unchanged(expander: Expander, #[case] template: &str) {
    assert_eq!(expander.expand(template, "d", "b", "s"), template);
}

// ---------------------------------------------------------------------------
// Field substitution
// ---------------------------------------------------------------------------

#[rstest]
fn stdout_substituted_only_when_non_empty(expander: Expander) {
    assert_eq!(expander.expand("out: $STDOUT", "", "", "line"), "out: line");
    assert_eq!(expander.expand("out: $STDOUT", "", "", ""), "out: $STDOUT");
}

#[rstest]
fn brief_and_detailed_substituted(expander: Expander) {
    let out = expander.expand(
        "${BRIEF_INFORMATION} | $DETAILED_INFORMATION",
        "the detail",
        "the brief",
        "",
    );
    assert_eq!(out, "the brief | the detail");
}

#[rstest]
fn empty_fields_substitute_empty(expander: Expander) {
    assert_eq!(expander.expand("[$BRIEF_INFORMATION]", "", "", ""), "[]");
}

#[rstest]
fn detailed_is_expanded_with_brief_and_stdout(expander: Expander) {
    let out = expander.expand(
        "$DETAILED_INFORMATION",
        "on $HOSTNAME: $BRIEF_INFORMATION\n$STDOUT",
        "disk full",
        "ERROR: no space",
    );
    assert_eq!(out, "on box.example.com: disk full\nERROR: no space");
}

#[rstest]
fn brief_is_expanded_with_hostname_only(expander: Expander) {
    let out = expander.expand("$BRIEF_INFORMATION", "", "$HOSTNAME: $STDOUT", "line");
    assert_eq!(out, "box.example.com: $STDOUT");
}

#[rstest]
fn detailed_cannot_reference_itself(expander: Expander) {
    let out = expander.expand("$DETAILED_INFORMATION", "x${DETAILED_INFORMATION}y", "", "");
    assert_eq!(out, "xy");
}

#[rstest]
fn substituted_values_are_not_rescanned(expander: Expander) {
    assert_eq!(expander.expand("$STDOUT", "", "", "$HOSTNAME"), "$HOSTNAME");
}

#[rstest]
fn expansion_is_idempotent_once_resolved(expander: Expander) {
    let once = expander.expand("$HOSTNAME $BRIEF_INFORMATION", "", "b", "");
    assert_eq!(expander.expand(&once, "", "b", ""), once);
}
