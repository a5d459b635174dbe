use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::database::{CustomListEntity, NewCustomList, NewTask, TaskEntity};
use crate::resource::error::{FieldErrors, NON_FIELD_ERRORS, ResourceError};

const REQUIRED: &str = "This field is required.";

pub const TITLE_MAX_LEN: usize = 155;
pub const DESCRIPTION_MAX_LEN: usize = 510;
pub const STATUS_MAX_LEN: usize = 10;
pub const CUSTOM_LIST_MAX_LEN: usize = 200;

/// 校验任务表单；`instance` 存在时提交的字段覆盖已有值
pub fn clean_task(instance: Option<&TaskEntity>, args: &Value) -> Result<NewTask, ResourceError> {
    let mut data = match instance {
        Some(task) => as_object(serde_json::to_value(task)?)?,
        None => Map::new(),
    };
    data.extend(as_object(args.clone())?);

    let mut errors = FieldErrors::new();
    let title = char_field(&data, "title", TITLE_MAX_LEN, false, &mut errors);
    let description = char_field(&data, "description", DESCRIPTION_MAX_LEN, true, &mut errors);
    let status = char_field(&data, "status", STATUS_MAX_LEN, true, &mut errors);
    let due_date = date_field(&data, "due_date", &mut errors);

    match (title, description, status, due_date) {
        (Some(title), Some(description), Some(status), Some(due_date)) if errors.is_empty() => {
            Ok(NewTask {
                title: title.unwrap_or_default(),
                description: description.unwrap_or_default(),
                status: status.unwrap_or_default(),
                due_date,
            })
        }
        _ => Err(ResourceError::Validation(errors)),
    }
}

/// 校验自定义列表表单
pub fn clean_custom_list(
    instance: Option<&CustomListEntity>,
    args: &Value,
) -> Result<NewCustomList, ResourceError> {
    let mut data = match instance {
        Some(list) => as_object(serde_json::to_value(list)?)?,
        None => Map::new(),
    };
    data.extend(as_object(args.clone())?);

    let mut errors = FieldErrors::new();
    match char_field(&data, "custom_list", CUSTOM_LIST_MAX_LEN, false, &mut errors) {
        Some(custom_list) if errors.is_empty() => Ok(NewCustomList {
            custom_list: Some(custom_list.unwrap_or_default()),
        }),
        _ => Err(ResourceError::Validation(errors)),
    }
}

/// 从参数中取出主键，支持数字和数字字符串
pub fn pk_from_args(args: &Value) -> Result<i64, ResourceError> {
    match args.get("pk") {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| ResourceError::invalid("pk", "Enter a whole number.")),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map_err(|_| ResourceError::invalid("pk", "Enter a whole number.")),
        None | Some(Value::Null) => Err(ResourceError::invalid("pk", REQUIRED)),
        Some(_) => Err(ResourceError::invalid("pk", "Enter a whole number.")),
    }
}

fn as_object(value: Value) -> Result<Map<String, Value>, ResourceError> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(ResourceError::invalid(NON_FIELD_ERRORS, "Expected an object.")),
    }
}

fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

// 外层 None 表示校验失败，内层 None 表示字段缺省
fn char_field(
    data: &Map<String, Value>,
    name: &str,
    max_len: usize,
    required: bool,
    errors: &mut FieldErrors,
) -> Option<Option<String>> {
    let value = match data.get(name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.trim().to_string()),
        Some(_) => {
            push_error(errors, name, "Enter a valid string.");
            return None;
        }
    };

    match value {
        None => {
            if required {
                push_error(errors, name, REQUIRED);
                return None;
            }
            Some(None)
        }
        Some(s) if s.is_empty() && required => {
            push_error(errors, name, REQUIRED);
            None
        }
        Some(s) => {
            let len = s.chars().count();
            if len > max_len {
                push_error(
                    errors,
                    name,
                    format!(
                        "Ensure this value has at most {} characters (it has {}).",
                        max_len, len
                    ),
                );
                return None;
            }
            Some(Some(s))
        }
    }
}

fn date_field(
    data: &Map<String, Value>,
    name: &str,
    errors: &mut FieldErrors,
) -> Option<Option<NaiveDate>> {
    match data.get(name) {
        None | Some(Value::Null) => Some(None),
        Some(Value::String(s)) if s.trim().is_empty() => Some(None),
        Some(Value::String(s)) => match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
            Ok(date) => Some(Some(date)),
            Err(_) => {
                push_error(errors, name, "Enter a valid date.");
                None
            }
        },
        Some(_) => {
            push_error(errors, name, "Enter a valid date.");
            None
        }
    }
}
