//! Function, parameter and type metadata.
//!
//! Descriptions are immutable once built and shared through `Arc`, so a
//! `FunctionDescription` fetched once can be reused across calls.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use super::rfc_type::{Direction, Encoding, RfcType};

/// A field of a structure or table row type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    /// Field name.
    pub name: String,
    /// Field type tag.
    pub field_type: RfcType,
    /// Byte length in the narrow layout.
    pub nuc_length: usize,
    /// Byte offset in the narrow layout.
    pub nuc_offset: usize,
    /// Byte length in the wide layout.
    pub uc_length: usize,
    /// Byte offset in the wide layout.
    pub uc_offset: usize,
    /// Decimal places (BCD fields).
    pub decimals: u32,
    /// Nested type for structure and table fields.
    pub type_desc: Option<Arc<TypeDescription>>,
}

impl FieldDescription {
    /// Byte length in the given encoding.
    pub fn length(&self, encoding: Encoding) -> usize {
        encoding.select(self.nuc_length, self.uc_length)
    }

    /// Byte offset in the given encoding.
    pub fn offset(&self, encoding: Encoding) -> usize {
        encoding.select(self.nuc_offset, self.uc_offset)
    }
}

/// Layout of a structure or table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescription {
    /// Type name.
    pub name: String,
    /// Total byte length in the narrow layout.
    pub nuc_length: usize,
    /// Total byte length in the wide layout.
    pub uc_length: usize,
    /// Fields in layout order.
    pub fields: Vec<FieldDescription>,
}

impl TypeDescription {
    /// Create an empty type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nuc_length: 0,
            uc_length: 0,
            fields: Vec::new(),
        }
    }

    /// Append a scalar field, packed after the previous one.
    ///
    /// `size` is in characters for text types and bytes for `Bcd`/`Byte`.
    pub fn with_field(self, name: impl Into<String>, field_type: RfcType, size: usize) -> Self {
        self.append(name.into(), field_type, size, 0, None)
    }

    /// Append a packed decimal field.
    pub fn with_bcd_field(self, name: impl Into<String>, size: usize, decimals: u32) -> Self {
        self.append(name.into(), RfcType::Bcd, size, decimals, None)
    }

    /// Append a structure or table field of the given nested type.
    pub fn with_nested_field(
        self,
        name: impl Into<String>,
        field_type: RfcType,
        type_desc: Arc<TypeDescription>,
    ) -> Self {
        self.append(name.into(), field_type, 0, 0, Some(type_desc))
    }

    fn append(
        mut self,
        name: String,
        field_type: RfcType,
        size: usize,
        decimals: u32,
        type_desc: Option<Arc<TypeDescription>>,
    ) -> Self {
        let (nuc_length, uc_length) = field_type.byte_lengths(size);
        self.fields.push(FieldDescription {
            name,
            field_type,
            nuc_length,
            nuc_offset: self.nuc_length,
            uc_length,
            uc_offset: self.uc_length,
            decimals,
            type_desc,
        });
        self.nuc_length += nuc_length;
        self.uc_length += uc_length;
        self
    }

    /// Total byte length in the given encoding.
    pub fn length(&self, encoding: Encoding) -> usize {
        encoding.select(self.nuc_length, self.uc_length)
    }

    /// Find a field by exact name.
    pub fn field(&self, name: &str) -> Option<&FieldDescription> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Find a field index by exact name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Get field names in layout order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

impl fmt::Display for TypeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "typeDesc(name= {}, nucLen= {}, ucLen= {}, fields= [{}])",
            self.name,
            self.nuc_length,
            self.uc_length,
            self.field_names().join(", ")
        )
    }
}

/// A parameter of a remote function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescription {
    pub name: String,
    pub parameter_type: RfcType,
    pub direction: Direction,
    pub nuc_length: usize,
    pub uc_length: usize,
    pub decimals: u32,
    pub default_value: String,
    pub parameter_text: String,
    /// Whether the caller may omit the parameter. Always set for tables.
    pub optional: bool,
    pub type_desc: Option<Arc<TypeDescription>>,
}

impl ParameterDescription {
    /// Create a required scalar parameter.
    ///
    /// `size` is in characters for text types and bytes for `Bcd`/`Byte`.
    pub fn new(
        name: impl Into<String>,
        parameter_type: RfcType,
        direction: Direction,
        size: usize,
    ) -> Self {
        let (nuc_length, uc_length) = parameter_type.byte_lengths(size);
        Self {
            name: name.into(),
            parameter_type,
            direction,
            nuc_length,
            uc_length,
            decimals: 0,
            default_value: String::new(),
            parameter_text: String::new(),
            optional: false,
            type_desc: None,
        }
    }

    /// Create a structure parameter.
    pub fn structure(
        name: impl Into<String>,
        direction: Direction,
        type_desc: Arc<TypeDescription>,
    ) -> Self {
        let mut param = Self::new(name, RfcType::Structure, direction, 0);
        param.nuc_length = type_desc.nuc_length;
        param.uc_length = type_desc.uc_length;
        param.type_desc = Some(type_desc);
        param
    }

    /// Create a table parameter with the given row type.
    ///
    /// Tables are optional: an omitted table is sent empty.
    pub fn table(name: impl Into<String>, row_type: Arc<TypeDescription>) -> Self {
        let mut param = Self::new(name, RfcType::Table, Direction::Tables, 0);
        param.nuc_length = row_type.nuc_length;
        param.uc_length = row_type.uc_length;
        param.optional = true;
        param.type_desc = Some(row_type);
        param
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = default_value.into();
        self
    }

    pub fn with_text(mut self, parameter_text: impl Into<String>) -> Self {
        self.parameter_text = parameter_text.into();
        self
    }

    /// Mark the parameter optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Byte length in the given encoding.
    pub fn length(&self, encoding: Encoding) -> usize {
        encoding.select(self.nuc_length, self.uc_length)
    }

    /// Whether the caller must supply this parameter.
    ///
    /// Only import and changing parameters can be required.
    pub fn is_required(&self) -> bool {
        !self.optional && matches!(self.direction, Direction::Import | Direction::Changing)
    }
}

impl fmt::Display for ParameterDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "paramDesc(name= {}, paramType= {}, dir= {}, nucLen= {}, ucLen= {}, dec= {}, defValue= {}, paramText= {}, optional= {}",
            self.name,
            self.parameter_type,
            self.direction,
            self.nuc_length,
            self.uc_length,
            self.decimals,
            self.default_value,
            self.parameter_text,
            self.optional
        )?;
        match &self.type_desc {
            Some(type_desc) => write!(f, ", typeDesc= {})", type_desc),
            None => write!(f, ")"),
        }
    }
}

/// Metadata of a remote function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDescription {
    pub name: String,
    pub parameters: Vec<ParameterDescription>,
}

impl FunctionDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    /// Append a parameter.
    pub fn with_parameter(mut self, parameter: ParameterDescription) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Find a parameter by exact, case-sensitive name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterDescription> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn parameter_index(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == name)
    }

    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }
}

impl fmt::Display for FunctionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FunctionDescription:")?;
        writeln!(f, " Name: {}", self.name)?;
        writeln!(f, " Parameters:")?;
        for param in &self.parameters {
            writeln!(f, "    {}", param)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_test_type() -> TypeDescription {
        TypeDescription::new("ZADDR")
            .with_field("STREET", RfcType::Char, 30)
            .with_field("ZIP", RfcType::Num, 5)
            .with_bcd_field("AMOUNT", 7, 2)
            .with_field("CREATED", RfcType::Date, 0)
    }

    #[test]
    fn test_layout_offsets() {
        let t = make_test_type();
        assert_eq!(t.nuc_length, 30 + 5 + 7 + 8);
        assert_eq!(t.uc_length, 60 + 10 + 7 + 16);

        let zip = t.field("ZIP").unwrap();
        assert_eq!((zip.nuc_offset, zip.uc_offset), (30, 60));
        assert_eq!(zip.length(Encoding::Wide), 10);

        let amount = t.field("AMOUNT").unwrap();
        assert_eq!(amount.offset(Encoding::Narrow), 35);
        assert_eq!(amount.offset(Encoding::Wide), 70);
        assert_eq!(amount.decimals, 2);
    }

    #[test]
    fn test_field_lookup_is_case_sensitive() {
        let t = make_test_type();
        assert_eq!(t.field_index("ZIP"), Some(1));
        assert_eq!(t.field_index("zip"), None);
    }

    #[test]
    fn test_required_parameters() {
        let import = ParameterDescription::new("NAME", RfcType::Char, Direction::Import, 10);
        assert!(import.is_required());
        assert!(!import.clone().optional().is_required());

        let export = ParameterDescription::new("COUNT", RfcType::Int, Direction::Export, 0);
        assert!(!export.is_required());

        let table = ParameterDescription::table("ROWS", Arc::new(make_test_type()));
        assert!(table.optional);
        assert!(!table.is_required());
        assert_eq!(table.uc_length, 93);
    }

    #[test]
    fn test_function_description_display() {
        let desc = FunctionDescription::new("Z_TEST")
            .with_parameter(ParameterDescription::new("NAME", RfcType::Char, Direction::Import, 10));
        let text = desc.to_string();
        assert!(text.starts_with("FunctionDescription:\n Name: Z_TEST\n"));
        assert!(text.contains("paramDesc(name= NAME, paramType= RFCTYPE_CHAR, dir= RFC_IMPORT, nucLen= 10, ucLen= 20"));
        assert_eq!(desc.parameter_names(), vec!["NAME"]);
    }
}
