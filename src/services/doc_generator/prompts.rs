//! LLM Prompt 模板
//!
//! 定义概览、组件分析、集成分析三个 Prompt 模板。模板正文里带有 JSON 示例，
//! 因此只替换声明过的 `{变量}`，其余花括号原样保留。

/// Prompt 模板：正文与声明的变量名
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    pub variables: &'static [&'static str],
    pub template: &'static str,
}

/// 概览文档 Prompt
pub const OVERVIEW_PROMPT: PromptTemplate = PromptTemplate {
    variables: &["languages", "components", "code_samples"],
    template: r#"You are a software documentation specialist. Based on the code analysis provided,
generate a comprehensive software overview document covering:

1. Introduction and Purpose
2. System Architecture Overview
3. Technologies Used
4. Key Components and Their Functions
5. Data Flow Description
6. Integration Points
7. Development and Deployment Considerations

Languages detected:
{languages}

Key components identified:
{components}

Code samples from key components:
{code_samples}

Be factual and concise while providing meaningful insights about the software's
purpose and design. Respond with a single JSON object of this shape and nothing else:

{
  "introduction": "purpose of the software",
  "architecture": "system architecture overview",
  "technologies": ["technology"],
  "keyComponents": [{"name": "component", "function": "what it does"}],
  "dataFlow": "how data moves through the system",
  "integrationPoints": ["integration point"],
  "developmentConsiderations": "development and deployment notes"
}
"#,
};

/// 组件分析 Prompt
pub const COMPONENT_PROMPT: PromptTemplate = PromptTemplate {
    variables: &["file_path", "language", "code"],
    template: r#"You are a software specification writer. Analyse the following code.

File path: {file_path}
Language: {language}

Code:
```
{code}
```

Focus on understanding the code's purpose rather than rewriting the implementation.
Respond with a single JSON object of this shape and nothing else:

{
  "componentName": "derived from the file name or the clear purpose of the code",
  "componentType": "module, class, utility, API, ...",
  "primaryFunctionality": "brief description of what this component does",
  "publicInterface": [{"name": "function or endpoint", "parameters": "...", "returns": "..."}],
  "dependencies": ["other components this relies on"],
  "dataStructures": ["key data structures used or defined"],
  "errorHandling": "how errors are handled, if present",
  "notes": "important implementation details or considerations"
}
"#,
};

/// 集成分析 Prompt
pub const INTEGRATION_PROMPT: PromptTemplate = PromptTemplate {
    variables: &["components", "project_structure"],
    template: r#"Based on the component analyses provided, create a comprehensive integration
analysis showing how these components work together.

Component analyses:
{components}

Project structure:
{project_structure}

Describe diagrams in text. Respond with a single JSON object of this shape and nothing else:

{
  "systemArchitecture": "overall architecture",
  "componentInteractions": "how components interact",
  "dataFlow": "data flow between components",
  "integrationPoints": ["key integration point"],
  "dependencyManagement": "dependencies and their management",
  "apiContracts": ["API contract, if applicable"],
  "systemRequirements": ["system requirement"],
  "deploymentArchitecture": "deployment architecture"
}
"#,
};

impl PromptTemplate {
    /// 单次扫描渲染模板
    ///
    /// `{name}` 只有在 `name` 是声明变量且 `values` 提供了取值时才会被替换；
    /// 替换进来的文本不会被再次扫描。
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let template = self.template;
        let mut output = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            output.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let substituted = after.find('}').and_then(|close| {
                let name = &after[..close];
                if !self.variables.contains(&name) {
                    return None;
                }
                values
                    .iter()
                    .find(|(key, _)| *key == name)
                    .map(|(_, value)| (*value, close))
            });

            match substituted {
                Some((value, close)) => {
                    output.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    output.push('{');
                    rest = after;
                }
            }
        }

        output.push_str(rest);
        output
    }
}

/// 格式化概览 Prompt
pub fn format_overview_prompt(languages: &str, components: &str, code_samples: &str) -> String {
    OVERVIEW_PROMPT.render(&[
        ("languages", languages),
        ("components", components),
        ("code_samples", code_samples),
    ])
}

/// 格式化组件分析 Prompt
pub fn format_component_prompt(file_path: &str, language: &str, code: &str) -> String {
    COMPONENT_PROMPT.render(&[("file_path", file_path), ("language", language), ("code", code)])
}

/// 格式化集成分析 Prompt
pub fn format_integration_prompt(components: &str, project_structure: &str) -> String {
    INTEGRATION_PROMPT.render(&[
        ("components", components),
        ("project_structure", project_structure),
    ])
}
