pub mod countdown;
pub mod language;
pub mod math_markup;

pub use countdown::{format_remaining, Countdown, TickOutcome};
pub use language::{detect_language, CodeLanguage, LanguageSelection};
pub use math_markup::{render_instruction, HtmlMathRenderer, MathMode, MathRenderError, MathRenderer};
