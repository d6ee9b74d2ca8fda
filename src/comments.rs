use std::fmt::Write;

use indexmap::IndexMap;

use crate::{config::CommentsConfig, page::Html};

pub const COMMENTS_ANCHOR: &str = "inject-comments-for-uterances";

#[derive(Clone, Debug, PartialEq)]
pub struct ScriptTag {
    pub src: String,
    pub attributes: IndexMap<String, Option<String>>,
}

impl ScriptTag {
    pub fn render(&self, html: &mut String) {
        let _ = write!(
            html,
            r#"<script src="{}""#,
            html_escape::encode_double_quoted_attribute(&self.src)
        );
        for (name, value) in &self.attributes {
            match value {
                Some(value) => {
                    let _ = write!(
                        html,
                        r#" {name}="{}""#,
                        html_escape::encode_double_quoted_attribute(value)
                    );
                }
                None => {
                    let _ = write!(html, " {name}");
                }
            }
        }
        html.push_str("></script>");
    }
}

/// The utterances comment widget for one repository.
#[derive(Clone, Debug)]
pub struct CommentWidget {
    script: ScriptTag,
}

impl CommentWidget {
    pub fn new(config: &CommentsConfig) -> Self {
        let mut attributes = IndexMap::new();
        attributes.insert("repo".to_string(), Some(config.repo.clone()));
        attributes.insert("issue-term".to_string(), Some(config.issue_term.clone()));
        attributes.insert("theme".to_string(), Some(config.theme.clone()));
        attributes.insert("crossorigin".to_string(), Some("anonymous".to_string()));
        attributes.insert("async".to_string(), None);

        CommentWidget {
            script: ScriptTag {
                src: config.src.clone(),
                attributes,
            },
        }
    }
}

/// The element the widget script is injected into.
#[derive(Clone, Debug, PartialEq)]
pub struct CommentsMount {
    pub anchor_id: &'static str,
    pub scripts: Vec<ScriptTag>,
}

impl Default for CommentsMount {
    fn default() -> Self {
        CommentsMount {
            anchor_id: COMMENTS_ANCHOR,
            scripts: Vec::new(),
        }
    }
}

impl CommentsMount {
    /// Injects the widget unless a script with the same source is already
    /// mounted. Returns whether anything was injected.
    pub fn ensure_widget(&mut self, widget: &CommentWidget) -> bool {
        if self
            .scripts
            .iter()
            .any(|script| script.src == widget.script.src)
        {
            return false;
        }

        self.scripts.push(widget.script.clone());
        true
    }

    pub fn render(&self) -> Html {
        let mut html = format!(r#"<div id="{}" class="comments">"#, self.anchor_id);
        for script in &self.scripts {
            script.render(&mut html);
        }
        html.push_str("</div>");
        Html(html)
    }
}
