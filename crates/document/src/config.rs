use cssom::CompatConfig;
use loader::LoaderConfig;
use style::MediaEnvironment;

/// Default presentation for the elements the engine knows about.
pub const UA_STYLE_SHEET: &str = "
html, address, blockquote, body, dd, div, dl, dt, fieldset, form, frame,
frameset, h1, h2, h3, h4, h5, h6, noframes, ol, p, ul, center, dir, hr,
menu, pre, header, footer, nav, section, article, aside, main, figure,
figcaption, details, summary, legend { display: block }
head, script, style, link, meta, title, template, [hidden] { display: none }
li { display: list-item }
table { display: table }
tr { display: table-row }
td, th { display: table-cell }
body { margin: 8px }
p, blockquote, ul, ol, dl, pre { margin-top: 1em; margin-bottom: 1em }
h1 { font-size: 2em; margin-top: 0.67em; margin-bottom: 0.67em; font-weight: bold }
h2 { font-size: 1.5em; margin-top: 0.83em; margin-bottom: 0.83em; font-weight: bold }
h3 { font-size: 1.17em; margin-top: 1em; margin-bottom: 1em; font-weight: bold }
b, strong, th { font-weight: bold }
i, em, cite, var { font-style: italic }
pre, code, kbd, samp, tt { font-family: monospace }
a:link { color: #0000ee; text-decoration-line: underline }
ul, ol { padding-left: 40px }
";

/// Everything a document needs to know about its surroundings.
#[derive(Clone, Debug)]
pub struct DocumentConfig {
    pub env: MediaEnvironment,
    pub loader: LoaderConfig,
    /// Text of the user-agent sheet; `None` styles with initial values only.
    pub ua_style_sheet: Option<String>,
    pub compat: CompatConfig,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            env: MediaEnvironment::default(),
            loader: LoaderConfig::default(),
            ua_style_sheet: Some(UA_STYLE_SHEET.to_string()),
            compat: CompatConfig::default(),
        }
    }
}

impl DocumentConfig {
    /// No user-agent sheet: computed values come from author rules and
    /// initial values alone.
    pub fn bare() -> Self {
        Self {
            ua_style_sheet: None,
            ..Self::default()
        }
    }
}
