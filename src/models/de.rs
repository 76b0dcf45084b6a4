//! 宽松的字段反序列化
//!
//! 后端对缺省字段有时给 `null`，数字字段有时是浮点数

use serde::{Deserialize, Deserializer};

/// `null` 按类型默认值处理
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 任意 JSON 数字取整为非负整数；`null`、负数和非有限值视为未配置
pub fn whole_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n.round().min(f64::from(u32::MAX)) as u32))
}
