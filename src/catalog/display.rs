/// Map an internal type name to the name SQL users write.
pub(super) fn sql_name(internal: &str) -> &str {
    match internal {
        "bool" => "boolean",
        "char" => "\"char\"",
        "bpchar" => "character",
        "decimal" => "numeric",
        "float4" => "real",
        "float8" => "double precision",
        "int2" => "smallint",
        "int4" => "integer",
        "int8" => "bigint",
        "time" => "time without time zone",
        "timestamp" => "timestamp without time zone",
        "timetz" => "time with time zone",
        "timestamptz" => "timestamp with time zone",
        "varbit" => "bit varying",
        "varchar" => "character varying",
        other => other,
    }
}

// Length-carrying types store the declared length plus the 4-byte varlena header.
const VARHDRSZ: i32 = 4;

// Interval modifiers carry the field range in the high 16 bits and the precision in the low 16;
// an all-ones precision means none was declared.
const INTERVAL_PRECISION_MASK: i32 = 0xFFFF;

pub(super) fn partial_name_with_facets(internal: &str, type_modifier: i32) -> String {
    if type_modifier == -1 {
        return sql_name(internal).to_string();
    }

    match internal {
        "bpchar" => format!("character({})", type_modifier - VARHDRSZ),
        "varchar" => format!("character varying({})", type_modifier - VARHDRSZ),
        "numeric" | "decimal" => {
            let precision = ((type_modifier - VARHDRSZ) >> 16) & 0xFFFF;
            let scale = (type_modifier - VARHDRSZ) & 0xFFFF;
            format!("numeric({precision},{scale})")
        }
        "timestamp" => format!("timestamp({type_modifier}) without time zone"),
        "timestamptz" => format!("timestamp({type_modifier}) with time zone"),
        "time" => format!("time({type_modifier}) without time zone"),
        "timetz" => format!("time({type_modifier}) with time zone"),
        "interval" => match type_modifier & INTERVAL_PRECISION_MASK {
            INTERVAL_PRECISION_MASK => "interval".to_string(),
            precision => format!("interval({precision})"),
        },
        "bit" => format!("bit({type_modifier})"),
        "varbit" => format!("bit varying({type_modifier})"),
        other => sql_name(other).to_string(),
    }
}
