//! 字段控件分派
//!
//! 字段类型是封闭集合，每个变体对应一个渲染函数，`match` 保证在编译期穷尽。
//! 生成的控件携带声明的字段名，提交的值据此回到 [`FormController::apply_change`]。
//!
//! [`FormController::apply_change`]: crate::state::FormController::apply_change

use carepulse_core::utils::escape_html;
use std::fmt::Write;

use crate::field::{FieldValue, RegistrationField};
use crate::state::FormController;

/// 自定义控件渲染函数
pub type SkeletonRenderer = fn(&FieldDescriptor, &FieldValue) -> Control;

/// 字段类型
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    Input,
    Textarea,
    PhoneInput,
    Checkbox,
    DatePicker,
    Select,
    Skeleton(SkeletonRenderer),
}

/// 输入框图标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    pub src: String,
    pub alt: String,
}

/// 下拉/单选选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub image: Option<String>,
}

impl SelectOption {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// 字段描述
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub field: RegistrationField,
    pub kind: FieldKind,
    pub label: String,
    pub placeholder: Option<String>,
    pub icon: Option<Icon>,
    pub options: Vec<SelectOption>,
}

impl FieldDescriptor {
    pub fn new(field: RegistrationField, kind: FieldKind, label: impl Into<String>) -> Self {
        Self {
            field,
            kind,
            label: label.into(),
            placeholder: None,
            icon: None,
            options: Vec::new(),
        }
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn icon(mut self, src: impl Into<String>, alt: impl Into<String>) -> Self {
        self.icon = Some(Icon {
            src: src.into(),
            alt: alt.into(),
        });
        self
    }

    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &'static str {
        self.field.as_str()
    }
}

/// 已选文件摘要
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

/// 交互控件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    TextInput {
        name: String,
        label: String,
        value: String,
        placeholder: Option<String>,
        icon: Option<Icon>,
    },
    Textarea {
        name: String,
        label: String,
        value: String,
        placeholder: Option<String>,
    },
    PhoneInput {
        name: String,
        label: String,
        value: String,
        placeholder: Option<String>,
        default_country: &'static str,
    },
    DatePicker {
        name: String,
        label: String,
        value: String,
        date_format: &'static str,
    },
    Select {
        name: String,
        label: String,
        placeholder: Option<String>,
        options: Vec<SelectOption>,
        selected: Option<String>,
    },
    Checkbox {
        name: String,
        label: String,
        checked: bool,
    },
    RadioGroup {
        name: String,
        label: String,
        options: Vec<SelectOption>,
        selected: Option<String>,
    },
    FileUploader {
        name: String,
        label: String,
        files: Vec<FileSummary>,
    },
}

/// 渲染结果：控件与已触碰字段的错误提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedField {
    pub control: Control,
    pub error: Option<String>,
}

/// 按字段类型生成控件
pub fn render_field(descriptor: &FieldDescriptor, form: &FormController) -> RenderedField {
    let value = form.value(descriptor.field);
    let control = match descriptor.kind {
        FieldKind::Input => render_input(descriptor, value),
        FieldKind::Textarea => render_textarea(descriptor, value),
        FieldKind::PhoneInput => render_phone_input(descriptor, value),
        FieldKind::Checkbox => render_checkbox(descriptor, value),
        FieldKind::DatePicker => render_date_picker(descriptor, value),
        FieldKind::Select => render_select(descriptor, value),
        FieldKind::Skeleton(renderer) => renderer(descriptor, value),
    };

    RenderedField {
        control,
        error: form.visible_error(descriptor.field).map(str::to_string),
    }
}

fn render_input(descriptor: &FieldDescriptor, value: &FieldValue) -> Control {
    Control::TextInput {
        name: descriptor.name().to_string(),
        label: descriptor.label.clone(),
        value: value.as_text().to_string(),
        placeholder: descriptor.placeholder.clone(),
        icon: descriptor.icon.clone(),
    }
}

fn render_textarea(descriptor: &FieldDescriptor, value: &FieldValue) -> Control {
    Control::Textarea {
        name: descriptor.name().to_string(),
        label: descriptor.label.clone(),
        value: value.as_text().to_string(),
        placeholder: descriptor.placeholder.clone(),
    }
}

fn render_phone_input(descriptor: &FieldDescriptor, value: &FieldValue) -> Control {
    Control::PhoneInput {
        name: descriptor.name().to_string(),
        label: descriptor.label.clone(),
        value: value.as_text().to_string(),
        placeholder: descriptor.placeholder.clone(),
        default_country: "US",
    }
}

fn render_checkbox(descriptor: &FieldDescriptor, value: &FieldValue) -> Control {
    Control::Checkbox {
        name: descriptor.name().to_string(),
        label: descriptor.label.clone(),
        checked: value.as_flag(),
    }
}

fn render_date_picker(descriptor: &FieldDescriptor, value: &FieldValue) -> Control {
    Control::DatePicker {
        name: descriptor.name().to_string(),
        label: descriptor.label.clone(),
        value: value.as_text().to_string(),
        date_format: "MM/dd/yyyy",
    }
}

fn render_select(descriptor: &FieldDescriptor, value: &FieldValue) -> Control {
    Control::Select {
        name: descriptor.name().to_string(),
        label: descriptor.label.clone(),
        placeholder: descriptor.placeholder.clone(),
        options: descriptor.options.clone(),
        selected: non_empty(value.as_text()),
    }
}

/// 单选组，用于性别
pub fn render_radio_group(descriptor: &FieldDescriptor, value: &FieldValue) -> Control {
    Control::RadioGroup {
        name: descriptor.name().to_string(),
        label: descriptor.label.clone(),
        options: descriptor.options.clone(),
        selected: non_empty(value.as_text()),
    }
}

/// 文件上传，用于身份证件
pub fn render_file_uploader(descriptor: &FieldDescriptor, value: &FieldValue) -> Control {
    let files = value
        .as_files()
        .iter()
        .map(|file| FileSummary {
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
            size: file.size(),
        })
        .collect();

    Control::FileUploader {
        name: descriptor.name().to_string(),
        label: descriptor.label.clone(),
        files,
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl Control {
    pub fn name(&self) -> &str {
        match self {
            Control::TextInput { name, .. }
            | Control::Textarea { name, .. }
            | Control::PhoneInput { name, .. }
            | Control::DatePicker { name, .. }
            | Control::Select { name, .. }
            | Control::Checkbox { name, .. }
            | Control::RadioGroup { name, .. }
            | Control::FileUploader { name, .. } => name,
        }
    }

    /// 渲染为HTML片段
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        match self {
            Control::TextInput {
                name,
                label,
                value,
                placeholder,
                icon,
            } => {
                write_label(&mut html, name, label);
                html.push_str("<div class=\"input-wrapper\">");
                if let Some(icon) = icon {
                    let _ = write!(
                        html,
                        "<img src=\"{}\" alt=\"{}\" width=\"24\" height=\"24\" class=\"ml-2\">",
                        escape_html(&icon.src),
                        escape_html(&icon.alt)
                    );
                }
                let _ = write!(
                    html,
                    "<input type=\"text\" id=\"{0}\" name=\"{0}\" value=\"{1}\"{2} class=\"shad-input\">",
                    escape_html(name),
                    escape_html(value),
                    placeholder_attr(placeholder)
                );
                html.push_str("</div>");
            }
            Control::Textarea {
                name,
                label,
                value,
                placeholder,
            } => {
                write_label(&mut html, name, label);
                let _ = write!(
                    html,
                    "<textarea id=\"{0}\" name=\"{0}\"{1} class=\"shad-textArea\">{2}</textarea>",
                    escape_html(name),
                    placeholder_attr(placeholder),
                    escape_html(value)
                );
            }
            Control::PhoneInput {
                name,
                label,
                value,
                placeholder,
                default_country,
            } => {
                write_label(&mut html, name, label);
                let _ = write!(
                    html,
                    "<input type=\"tel\" id=\"{0}\" name=\"{0}\" value=\"{1}\"{2} data-country=\"{3}\" class=\"input-phone\">",
                    escape_html(name),
                    escape_html(value),
                    placeholder_attr(placeholder),
                    default_country
                );
            }
            Control::DatePicker {
                name,
                label,
                value,
                date_format,
            } => {
                write_label(&mut html, name, label);
                let _ = write!(
                    html,
                    "<input type=\"date\" id=\"{0}\" name=\"{0}\" value=\"{1}\" data-format=\"{2}\" class=\"date-picker\">",
                    escape_html(name),
                    escape_html(value),
                    date_format
                );
            }
            Control::Select {
                name,
                label,
                placeholder,
                options,
                selected,
            } => {
                write_label(&mut html, name, label);
                let _ = write!(
                    html,
                    "<select id=\"{0}\" name=\"{0}\" class=\"shad-select-trigger\">",
                    escape_html(name)
                );
                let _ = write!(
                    html,
                    "<option value=\"\">{}</option>",
                    escape_html(placeholder.as_deref().unwrap_or(""))
                );
                for option in options {
                    let is_selected = selected.as_deref() == Some(option.value.as_str());
                    let image = option
                        .image
                        .as_ref()
                        .map(|image| format!(" data-image=\"{}\"", escape_html(image)))
                        .unwrap_or_default();
                    let _ = write!(
                        html,
                        "<option value=\"{}\"{}{}>{}</option>",
                        escape_html(&option.value),
                        image,
                        if is_selected { " selected" } else { "" },
                        escape_html(&option.label)
                    );
                }
                html.push_str("</select>");
            }
            Control::Checkbox {
                name,
                label,
                checked,
            } => {
                let _ = write!(
                    html,
                    "<div class=\"checkbox\"><input type=\"checkbox\" id=\"{0}\" name=\"{0}\" value=\"true\"{1}><label for=\"{0}\" class=\"checkbox-label\">{2}</label></div>",
                    escape_html(name),
                    if *checked { " checked" } else { "" },
                    escape_html(label)
                );
            }
            Control::RadioGroup {
                name,
                label,
                options,
                selected,
            } => {
                let _ = write!(html, "<fieldset class=\"radio-group\"><legend>{}</legend>", escape_html(label));
                for option in options {
                    let id = format!("{}-{}", name, option.value);
                    let is_selected = selected.as_deref() == Some(option.value.as_str());
                    let _ = write!(
                        html,
                        "<div class=\"radio-group\"><input type=\"radio\" id=\"{0}\" name=\"{1}\" value=\"{2}\"{3}><label for=\"{0}\" class=\"cursor-pointer\">{4}</label></div>",
                        escape_html(&id),
                        escape_html(name),
                        escape_html(&option.value),
                        if is_selected { " checked" } else { "" },
                        escape_html(&option.label)
                    );
                }
                html.push_str("</fieldset>");
            }
            Control::FileUploader { name, label, files } => {
                write_label(&mut html, name, label);
                let _ = write!(
                    html,
                    "<div class=\"file-upload\"><input type=\"file\" id=\"{0}\" name=\"{0}\" accept=\"image/*,application/pdf\">",
                    escape_html(name)
                );
                for file in files {
                    let _ = write!(
                        html,
                        "<p class=\"file-upload_label\">{} ({}, {} bytes)</p>",
                        escape_html(&file.file_name),
                        escape_html(&file.content_type),
                        file.size
                    );
                }
                html.push_str("</div>");
            }
        }
        html
    }
}

impl RenderedField {
    /// 控件加错误提示的完整HTML
    pub fn to_html(&self) -> String {
        let mut html = String::from("<div class=\"form-field\">");
        html.push_str(&self.control.to_html());
        if let Some(error) = &self.error {
            let _ = write!(html, "<p class=\"shad-error\">{}</p>", escape_html(error));
        }
        html.push_str("</div>");
        html
    }
}

fn write_label(html: &mut String, name: &str, label: &str) {
    let _ = write!(
        html,
        "<label for=\"{}\" class=\"shad-input-label\">{}</label>",
        escape_html(name),
        escape_html(label)
    );
}

fn placeholder_attr(placeholder: &Option<String>) -> String {
    placeholder
        .as_ref()
        .map(|text| format!(" placeholder=\"{}\"", escape_html(text)))
        .unwrap_or_default()
}
