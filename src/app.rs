pub mod approot;
pub mod config;
pub mod input_parse;
pub mod outfmt;

// Version is of the format 0.YY.MM[.i], or 0.year.month.optional_minor_increment,
// so it is clear when the tax rules were last reviewed.
// Major version is kept at 0. Nothing here has been verified by a tax advisor.
pub const ILCG_APP_VERSION: &str = "0.26.10";
