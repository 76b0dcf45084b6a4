//! 数学公式渲染 - 业务能力层
//!
//! 按固定优先级扫描题干中的四种公式定界符：
//! `\[…\]`（块级）、`\(…\)`（行内）、`$$…$$`（块级）、`$…$`（行内），
//! 把每个匹配片段替换为渲染结果。单个片段渲染失败时保留原文，不影响其余片段。

use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;
use tracing::debug;

/// 公式显示模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathMode {
    Inline,
    Display,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathRenderError {
    #[error("公式为空")]
    Empty,
    #[error("花括号不匹配: {0}")]
    UnbalancedBraces(String),
}

/// 公式渲染器
pub trait MathRenderer: Send + Sync {
    fn render(&self, tex: &str, mode: MathMode) -> Result<String, MathRenderError>;
}

/// 按优先级排列的 (定界符正则, 显示模式)
static MATH_PASSES: LazyLock<Vec<(Regex, MathMode)>> = LazyLock::new(|| {
    [
        (r"(?s)\\\[(.+?)\\\]", MathMode::Display),
        (r"(?s)\\\((.+?)\\\)", MathMode::Inline),
        (r"(?s)\$\$(.+?)\$\$", MathMode::Display),
        (r"(?s)\$(.+?)\$", MathMode::Inline),
    ]
    .into_iter()
    .map(|(pattern, mode)| (Regex::new(pattern).expect("公式定界符正则无效"), mode))
    .collect()
});

/// 渲染题干中的所有公式片段
pub fn render_instruction(text: &str, renderer: &dyn MathRenderer) -> String {
    let mut rendered = text.to_string();
    for (regex, mode) in MATH_PASSES.iter() {
        rendered = regex
            .replace_all(&rendered, |caps: &Captures| {
                match renderer.render(&caps[1], *mode) {
                    Ok(markup) => markup,
                    Err(e) => {
                        debug!("公式渲染失败，保留原文: {}", e);
                        caps[0].to_string()
                    }
                }
            })
            .into_owned();
    }
    rendered
}

/// 默认渲染器：输出带 class 的 `<span>`，TeX 源码做 HTML 转义
///
/// `$` 与 `\` 也会转义，渲染结果不会再被后续定界符匹配
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlMathRenderer;

impl MathRenderer for HtmlMathRenderer {
    fn render(&self, tex: &str, mode: MathMode) -> Result<String, MathRenderError> {
        let formula = tex.trim();
        if formula.is_empty() {
            return Err(MathRenderError::Empty);
        }
        check_braces(formula)?;

        let class = match mode {
            MathMode::Inline => "math math-inline",
            MathMode::Display => "math math-display",
        };
        Ok(format!(
            r#"<span class="{}">{}</span>"#,
            class,
            escape_html(formula)
        ))
    }
}

fn check_braces(formula: &str) -> Result<(), MathRenderError> {
    let mut depth: i32 = 0;
    let mut escaped = false;
    for c in formula.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(MathRenderError::UnbalancedBraces(formula.to_string()));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(MathRenderError::UnbalancedBraces(formula.to_string()));
    }
    Ok(())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '$' => out.push_str("&#36;"),
            '\\' => out.push_str("&#92;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str) -> String {
        render_instruction(text, &HtmlMathRenderer)
    }

    #[test]
    fn inline_dollar_is_rendered() {
        assert_eq!(
            render("Calculer $x^2$ pour x = 3"),
            r#"Calculer <span class="math math-inline">x^2</span> pour x = 3"#
        );
    }

    #[test]
    fn unmatched_dollar_is_untouched() {
        assert_eq!(render("Calculer $x^2 pour x = 3"), "Calculer $x^2 pour x = 3");
    }

    #[test]
    fn all_delimiters_in_precedence_order() {
        let out = render(r"A \[a+b\] B \(c\) C $$d$$ D $e$");
        assert_eq!(
            out,
            concat!(
                r#"A <span class="math math-display">a+b</span> "#,
                r#"B <span class="math math-inline">c</span> "#,
                r#"C <span class="math math-display">d</span> "#,
                r#"D <span class="math math-inline">e</span>"#
            )
        );
    }

    #[test]
    fn double_dollar_wins_over_single() {
        let out = render("$$\\frac{1}{2}$$");
        assert_eq!(
            out,
            r#"<span class="math math-display">&#92;frac{1}{2}</span>"#
        );
    }

    #[test]
    fn failed_span_does_not_abort_the_rest() {
        let out = render("$\\frac{1}{2$ puis $y$");
        assert!(out.starts_with("$\\frac{1}{2$ puis "));
        assert!(out.ends_with(r#"<span class="math math-inline">y</span>"#));
    }

    #[test]
    fn block_math_spans_lines_and_is_not_rematched() {
        let out = render("\\[\na = $b$\n\\]");
        assert_eq!(
            out,
            r#"<span class="math math-display">a = &#36;b&#36;</span>"#
        );
    }

    #[test]
    fn html_is_escaped() {
        assert_eq!(
            HtmlMathRenderer.render("a<b", MathMode::Inline).unwrap(),
            r#"<span class="math math-inline">a&lt;b</span>"#
        );
        assert_eq!(
            HtmlMathRenderer.render("  ", MathMode::Inline),
            Err(MathRenderError::Empty)
        );
    }
}
