//! 代码语言识别 - 业务能力层
//!
//! 按固定优先级用关键字正则扫描题干，第一个命中的语言即为结果

use std::sync::LazyLock;

use phf::phf_map;
use regex::Regex;

use crate::error::SessionError;

/// 代码题可选语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeLanguage {
    Php,
    JavaScript,
    TypeScript,
    Python,
    Java,
    Cpp,
    C,
    Sql,
    Markdown,
    CSharp,
    Dart,
}

static LANGUAGE_BY_VALUE: phf::Map<&'static str, CodeLanguage> = phf_map! {
    "php" => CodeLanguage::Php,
    "javascript" => CodeLanguage::JavaScript,
    "js" => CodeLanguage::JavaScript,
    "typescript" => CodeLanguage::TypeScript,
    "ts" => CodeLanguage::TypeScript,
    "python" => CodeLanguage::Python,
    "py" => CodeLanguage::Python,
    "java" => CodeLanguage::Java,
    "cpp" => CodeLanguage::Cpp,
    "c" => CodeLanguage::C,
    "sql" => CodeLanguage::Sql,
    "markdown" => CodeLanguage::Markdown,
    "csharp" => CodeLanguage::CSharp,
    "dart" => CodeLanguage::Dart,
};

impl CodeLanguage {
    /// 下拉框中的展示顺序
    pub const ALL: [CodeLanguage; 11] = [
        CodeLanguage::Php,
        CodeLanguage::JavaScript,
        CodeLanguage::TypeScript,
        CodeLanguage::Python,
        CodeLanguage::Java,
        CodeLanguage::Cpp,
        CodeLanguage::C,
        CodeLanguage::Sql,
        CodeLanguage::Markdown,
        CodeLanguage::CSharp,
        CodeLanguage::Dart,
    ];

    pub fn value(self) -> &'static str {
        match self {
            CodeLanguage::Php => "php",
            CodeLanguage::JavaScript => "javascript",
            CodeLanguage::TypeScript => "typescript",
            CodeLanguage::Python => "python",
            CodeLanguage::Java => "java",
            CodeLanguage::Cpp => "cpp",
            CodeLanguage::C => "c",
            CodeLanguage::Sql => "sql",
            CodeLanguage::Markdown => "markdown",
            CodeLanguage::CSharp => "csharp",
            CodeLanguage::Dart => "dart",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CodeLanguage::Php => "PHP",
            CodeLanguage::JavaScript => "JavaScript",
            CodeLanguage::TypeScript => "TypeScript",
            CodeLanguage::Python => "Python",
            CodeLanguage::Java => "Java",
            CodeLanguage::Cpp => "C++",
            CodeLanguage::C => "C",
            CodeLanguage::Sql => "SQL",
            CodeLanguage::Markdown => "Markdown",
            CodeLanguage::CSharp => "C#",
            CodeLanguage::Dart => "Dart",
        }
    }

    /// 从取值或别名解析（不区分大小写）
    pub fn from_value(value: &str) -> Result<Self, SessionError> {
        LANGUAGE_BY_VALUE
            .get(value.trim().to_lowercase().as_str())
            .copied()
            .ok_or_else(|| SessionError::UnknownLanguage {
                value: value.to_string(),
            })
    }
}

/// 按优先级排列的 (关键字正则, 语言)
static LANGUAGE_PATTERNS: LazyLock<Vec<(Regex, CodeLanguage)>> = LazyLock::new(|| {
    [
        (r"(?i)\bphp\b|<\?php", CodeLanguage::Php),
        (
            r"(?i)\bjavascript\b|\bjs\b|console\.log|function\s*\(",
            CodeLanguage::JavaScript,
        ),
        (r"(?i)\btypescript\b|\bts\b", CodeLanguage::TypeScript),
        (r"(?i)\bpython\b|\bpy\b|def |print\s*\(", CodeLanguage::Python),
        (
            r"(?i)\bjava\b|public\s+class|System\.out\.println",
            CodeLanguage::Java,
        ),
        (
            r"(?i)\bc\+\+|\bcpp\b|std::|#include\s*<iostream>",
            CodeLanguage::Cpp,
        ),
        (r"(?i)\bc\b|#include\s*<stdio\.h>", CodeLanguage::C),
        (
            r"(?i)\bsql\b|SELECT |INSERT |UPDATE |DELETE |CREATE TABLE",
            CodeLanguage::Sql,
        ),
        (r"(?i)\bmarkdown\b|# |\*\*|__|\[.*\]\(.*\)", CodeLanguage::Markdown),
        (
            r"(?i)\bc#|\bcsharp\b|using\s+System|Console\.WriteLine",
            CodeLanguage::CSharp,
        ),
        (r"(?i)\bdart\b|void\s+main\s*\(", CodeLanguage::Dart),
    ]
    .into_iter()
    .map(|(pattern, lang)| (Regex::new(pattern).expect("语言识别正则无效"), lang))
    .collect()
});

/// 从题干识别代码语言，未命中时返回 None
pub fn detect_language(instruction: &str) -> Option<CodeLanguage> {
    LANGUAGE_PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(instruction))
        .map(|(_, lang)| *lang)
}

/// 当前题目的语言选择
///
/// 题目首次加载时自动识别一次；手动选择后不再被识别结果覆盖
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageSelection {
    selected: CodeLanguage,
    detected: bool,
    overridden: bool,
}

impl LanguageSelection {
    pub fn detect(instruction: &str, default: CodeLanguage) -> Self {
        match detect_language(instruction) {
            Some(lang) => Self {
                selected: lang,
                detected: true,
                overridden: false,
            },
            None => Self {
                selected: default,
                detected: false,
                overridden: false,
            },
        }
    }

    pub fn selected(&self) -> CodeLanguage {
        self.selected
    }

    pub fn was_detected(&self) -> bool {
        self.detected
    }

    pub fn is_overridden(&self) -> bool {
        self.overridden
    }

    pub fn override_with(&mut self, lang: CodeLanguage) {
        self.selected = lang;
        self.overridden = true;
    }
}
