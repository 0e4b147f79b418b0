//! # XML Loader / Validator
//!
//! Parses IPPcode21's XML encoding into a [`Program`], validating the root
//! schema, per-instruction shape, and per-operand lexical rules along the
//! way. [`load`] is a pure function: on any problem it returns a classified
//! [`IppError`] rather than printing or exiting — termination is the
//! caller's job, once, at the top of `main`.

use std::collections::{HashMap, HashSet};

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::reader::Reader;

use crate::error::{ErrorKind, IppError};
use crate::hexfloat::parse_hex_float;
use crate::instruction::{FrameTag, Instruction, Operand, Program, VarRef};
use crate::lex;
use crate::opcode::{Opcode, OperandKind};
use crate::value::Value;

/// Parse and validate `bytes` as an IPPcode21 XML program.
pub fn load(bytes: &[u8]) -> Result<Program, IppError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ErrorKind::BadXml.with_msg("source is not valid UTF-8"))?;
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let root_attrs = loop {
        match next_event(&mut reader)? {
            Event::Start(e) if qname_is(e.name(), "program") => break read_attrs(&e)?,
            Event::Empty(e) if qname_is(e.name(), "program") => {
                let attrs = read_attrs(&e)?;
                validate_root_attrs(&attrs)?;
                return Ok(Program::new(Vec::new(), HashMap::new()));
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
            Event::Eof => return Err(ErrorKind::BadStruct.with_msg("missing <program> root element")),
            _ => return Err(ErrorKind::BadStruct.with_msg("root element is not <program>")),
        }
    };
    validate_root_attrs(&root_attrs)?;

    let mut raw: Vec<(u64, Opcode, Vec<Operand>)> = Vec::new();
    let mut seen_orders: HashSet<u64> = HashSet::new();

    loop {
        match next_event(&mut reader)? {
            Event::Start(e) if qname_is(e.name(), "instruction") => {
                let (order, opcode) = parse_instruction_attrs(&e)?;
                if !seen_orders.insert(order) {
                    return Err(ErrorKind::BadStruct.with_msg(format!("duplicate instruction order {order}")));
                }
                let args = parse_instruction_args(&mut reader, opcode)?;
                raw.push((order, opcode, args));
            }
            Event::Empty(e) if qname_is(e.name(), "instruction") => {
                let (order, opcode) = parse_instruction_attrs(&e)?;
                if opcode.arity() != 0 {
                    return Err(ErrorKind::BadStruct.with_msg(format!("{opcode} requires arguments")));
                }
                if !seen_orders.insert(order) {
                    return Err(ErrorKind::BadStruct.with_msg(format!("duplicate instruction order {order}")));
                }
                raw.push((order, opcode, Vec::new()));
            }
            Event::End(e) if qname_is(e.name(), "program") => break,
            Event::Eof => return Err(ErrorKind::BadStruct.with_msg("unexpected end of document")),
            _ => return Err(ErrorKind::BadStruct.with_msg("unexpected content inside <program>")),
        }
    }

    raw.sort_by_key(|(order, _, _)| *order);

    let mut instructions = Vec::with_capacity(raw.len());
    let mut labels = HashMap::new();
    for (order, opcode, args) in raw {
        if opcode == Opcode::Label {
            if let Some(Operand::Label(name)) = args.first() {
                if labels.insert(name.clone(), instructions.len()).is_some() {
                    return Err(ErrorKind::UndefRedef.with_msg(format!("label {name} redefined")));
                }
            }
        }
        instructions.push(Instruction { opcode, args, order });
    }

    Ok(Program::new(instructions, labels))
}

fn next_event<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>, IppError> {
    reader
        .read_event()
        .map_err(|e| ErrorKind::BadXml.with_msg(format!("malformed xml: {e}")))
}

fn qname_is(name: QName<'_>, expected: &str) -> bool {
    name.as_ref() == expected.as_bytes()
}

fn read_attrs(e: &BytesStart<'_>) -> Result<Vec<(String, String)>, IppError> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|_| ErrorKind::BadXml.with_msg("malformed attribute"))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr
            .unescape_value()
            .map_err(|_| ErrorKind::BadXml.with_msg("malformed attribute value"))?
            .to_string();
        out.push((key, value));
    }
    Ok(out)
}

fn validate_root_attrs(attrs: &[(String, String)]) -> Result<(), IppError> {
    let mut language = None;
    for (k, v) in attrs {
        match k.as_str() {
            "language" => language = Some(v.clone()),
            "name" | "description" => {}
            other => return Err(ErrorKind::BadStruct.with_msg(format!("unexpected root attribute {other}"))),
        }
    }
    match language {
        Some(l) if l.eq_ignore_ascii_case("IPPcode21") => Ok(()),
        Some(l) => Err(ErrorKind::BadStruct.with_msg(format!("unsupported language {l}"))),
        None => Err(ErrorKind::BadStruct.with_msg("missing required language attribute")),
    }
}

fn parse_instruction_attrs(e: &BytesStart<'_>) -> Result<(u64, Opcode), IppError> {
    let attrs = read_attrs(e)?;
    if attrs.len() != 2 {
        return Err(ErrorKind::BadStruct.with_msg("instruction must have exactly order and opcode attributes"));
    }
    let mut order = None;
    let mut opcode_text = None;
    for (k, v) in &attrs {
        match k.as_str() {
            "order" => order = Some(v.clone()),
            "opcode" => opcode_text = Some(v.clone()),
            other => return Err(ErrorKind::BadStruct.with_msg(format!("unexpected instruction attribute {other}"))),
        }
    }
    let order_text = order.ok_or_else(|| ErrorKind::BadStruct.with_msg("instruction missing order attribute"))?;
    let order: u64 = order_text
        .parse()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ErrorKind::BadStruct.with_msg(format!("invalid order attribute {order_text}")))?;
    let opcode_text = opcode_text
        .ok_or_else(|| ErrorKind::BadStruct.with_msg("instruction missing opcode attribute"))?
        .to_uppercase();
    let opcode = Opcode::from_mnemonic(&opcode_text)
        .ok_or_else(|| ErrorKind::BadStruct.with_msg(format!("unknown opcode {opcode_text}")))?;
    Ok((order, opcode))
}

fn arg_index(name: &str) -> Result<usize, IppError> {
    match name {
        "arg1" => Ok(1),
        "arg2" => Ok(2),
        "arg3" => Ok(3),
        other => Err(ErrorKind::BadStruct.with_msg(format!("unexpected argument element {other}"))),
    }
}

fn arg_type_attr(e: &BytesStart<'_>) -> Result<String, IppError> {
    let attrs = read_attrs(e)?;
    if attrs.len() != 1 || attrs[0].0 != "type" {
        return Err(ErrorKind::BadStruct.with_msg("argument element must have exactly one type attribute"));
    }
    Ok(attrs[0].1.clone())
}

fn read_text(reader: &mut Reader<&[u8]>) -> Result<String, IppError> {
    let mut text = String::new();
    loop {
        match next_event(reader)? {
            Event::Text(t) => {
                let unescaped = t.unescape().map_err(|_| ErrorKind::BadXml.with_msg("malformed text content"))?;
                text.push_str(&unescaped);
            }
            Event::CData(t) => {
                text.push_str(&String::from_utf8_lossy(&t));
            }
            Event::End(_) => break,
            Event::Eof => return Err(ErrorKind::BadStruct.with_msg("unexpected end of document inside argument")),
            _ => {}
        }
    }
    Ok(text)
}

fn parse_instruction_args(reader: &mut Reader<&[u8]>, opcode: Opcode) -> Result<Vec<Operand>, IppError> {
    let kinds = opcode.operand_kinds();
    let mut slots: Vec<Option<Operand>> = vec![None; kinds.len()];

    loop {
        match next_event(reader)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let idx = arg_index(&name)?;
                if idx > kinds.len() || slots[idx - 1].is_some() {
                    return Err(ErrorKind::BadStruct.with_msg(format!("unexpected or duplicate argument {name}")));
                }
                let type_attr = arg_type_attr(&e)?;
                let text = read_text(reader)?;
                slots[idx - 1] = Some(decode_operand(kinds[idx - 1], &type_attr, &text)?);
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let idx = arg_index(&name)?;
                if idx > kinds.len() || slots[idx - 1].is_some() {
                    return Err(ErrorKind::BadStruct.with_msg(format!("unexpected or duplicate argument {name}")));
                }
                let type_attr = arg_type_attr(&e)?;
                slots[idx - 1] = Some(decode_operand(kinds[idx - 1], &type_attr, "")?);
            }
            Event::End(e) if qname_is(e.name(), "instruction") => break,
            Event::Eof => return Err(ErrorKind::BadStruct.with_msg("unexpected end of document inside instruction")),
            _ => return Err(ErrorKind::BadStruct.with_msg("unexpected content inside <instruction>")),
        }
    }

    if slots.iter().any(Option::is_none) {
        return Err(ErrorKind::BadStruct.with_msg(format!("{opcode} is missing a required argument")));
    }
    Ok(slots.into_iter().map(Option::unwrap).collect())
}

fn decode_operand(kind: OperandKind, type_attr: &str, text: &str) -> Result<Operand, IppError> {
    match kind {
        OperandKind::Var => {
            if type_attr != "var" {
                return Err(ErrorKind::BadStruct.with_msg(format!("expected var operand, got type {type_attr}")));
            }
            decode_var(text)
        }
        OperandKind::Label => {
            if type_attr != "label" {
                return Err(ErrorKind::BadStruct.with_msg(format!("expected label operand, got type {type_attr}")));
            }
            if !lex::is_valid_label(text) {
                return Err(ErrorKind::BadStruct.with_msg(format!("invalid label name {text}")));
            }
            Ok(Operand::Label(text.to_string()))
        }
        OperandKind::Type => {
            if type_attr != "type" {
                return Err(ErrorKind::BadStruct.with_msg(format!("expected type operand, got type {type_attr}")));
            }
            if !matches!(text, "int" | "string" | "bool" | "float") {
                return Err(ErrorKind::BadStruct.with_msg(format!("invalid type token {text}")));
            }
            Ok(Operand::TypeTag(text.to_string()))
        }
        OperandKind::Symb => decode_symb(type_attr, text),
    }
}

fn decode_var(text: &str) -> Result<Operand, IppError> {
    let (frame_text, name) = lex::split_var(text)
        .ok_or_else(|| ErrorKind::BadStruct.with_msg(format!("invalid variable reference {text}")))?;
    let frame = match frame_text {
        "GF" => FrameTag::Global,
        "TF" => FrameTag::Temporary,
        "LF" => FrameTag::Local,
        _ => unreachable!("lex::split_var only accepts GF/TF/LF"),
    };
    Ok(Operand::Var(VarRef { frame, name: name.to_string() }))
}

fn decode_symb(type_attr: &str, text: &str) -> Result<Operand, IppError> {
    match type_attr {
        "var" => decode_var(text),
        "int" => {
            let v: i64 = text
                .parse()
                .map_err(|_| ErrorKind::BadStruct.with_msg(format!("invalid int literal {text}")))?;
            Ok(Operand::Literal(Value::Int(v)))
        }
        "float" => {
            let v = parse_hex_float(text)
                .ok_or_else(|| ErrorKind::BadStruct.with_msg(format!("invalid float literal {text}")))?;
            Ok(Operand::Literal(Value::Float(v)))
        }
        "bool" => match text {
            "true" => Ok(Operand::Literal(Value::Bool(true))),
            "false" => Ok(Operand::Literal(Value::Bool(false))),
            _ => Err(ErrorKind::BadStruct.with_msg(format!("invalid bool literal {text}"))),
        },
        "nil" => {
            if text == "nil" {
                Ok(Operand::Literal(Value::Nil))
            } else {
                Err(ErrorKind::BadStruct.with_msg(format!("invalid nil literal {text}")))
            }
        }
        "string" => {
            if !lex::is_valid_string_literal(text) {
                return Err(ErrorKind::BadStruct.with_msg(format!("invalid string literal {text}")));
            }
            Ok(Operand::Literal(Value::Str(lex::decode_string_escapes(text))))
        }
        other => Err(ErrorKind::BadStruct.with_msg(format!("unsupported symb type {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prog(xml: &str) -> Result<Program, IppError> {
        load(xml.as_bytes())
    }

    #[test]
    fn loads_scenario_one() {
        let xml = r#"<program language="IPPcode21">
            <instruction order="1" opcode="DEFVAR"><arg1 type="var">GF@a</arg1></instruction>
            <instruction order="2" opcode="MOVE"><arg1 type="var">GF@a</arg1><arg2 type="int">5</arg2></instruction>
            <instruction order="3" opcode="WRITE"><arg1 type="var">GF@a</arg1></instruction>
            <instruction order="4" opcode="EXIT"><arg1 type="int">0</arg1></instruction>
        </program>"#;
        let p = prog(xml).unwrap();
        assert_eq!(p.len(), 4);
        assert_eq!(p.instructions[1].opcode, Opcode::Move);
    }

    #[test]
    fn rejects_wrong_language() {
        let xml = r#"<program language="other"><instruction order="1" opcode="CREATEFRAME"/></program>"#;
        let err = prog(xml).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadStruct);
    }

    #[test]
    fn language_is_case_insensitive() {
        let xml = r#"<program language="ippCODE21"><instruction order="1" opcode="CREATEFRAME"/></program>"#;
        assert!(prog(xml).is_ok());
    }

    #[test]
    fn duplicate_order_is_bad_struct() {
        let xml = r#"<program language="IPPcode21">
            <instruction order="1" opcode="CREATEFRAME"/>
            <instruction order="1" opcode="PUSHFRAME"/>
        </program>"#;
        let err = prog(xml).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadStruct);
    }

    #[test]
    fn duplicate_label_is_undef_redef() {
        let xml = r#"<program language="IPPcode21">
            <instruction order="1" opcode="LABEL"><arg1 type="label">L</arg1></instruction>
            <instruction order="2" opcode="LABEL"><arg1 type="label">L</arg1></instruction>
        </program>"#;
        let err = prog(xml).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefRedef);
    }

    #[test]
    fn unknown_opcode_is_bad_struct() {
        let xml = r#"<program language="IPPcode21"><instruction order="1" opcode="NOPE"/></program>"#;
        let err = prog(xml).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadStruct);
    }

    #[test]
    fn wrong_argument_count_is_bad_struct() {
        let xml = r#"<program language="IPPcode21"><instruction order="1" opcode="ADD"><arg1 type="var">GF@a</arg1></instruction></program>"#;
        let err = prog(xml).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadStruct);
    }

    #[test]
    fn malformed_xml_is_bad_xml() {
        let xml = r#"<program language="IPPcode21"><instruction order="1" opcode="CREATEFRAME">"#;
        let err = prog(xml).unwrap_err();
        assert_eq!(err.kind, ErrorKind::BadXml);
    }

    #[test]
    fn string_escape_decodes_in_loader() {
        let xml = r#"<program language="IPPcode21">
            <instruction order="1" opcode="PUSHS"><arg1 type="string">A\032B</arg1></instruction>
        </program>"#;
        let p = prog(xml).unwrap();
        match &p.instructions[0].args[0] {
            Operand::Literal(Value::Str(s)) => assert_eq!(s, "A B"),
            other => panic!("unexpected operand {other:?}"),
        }
    }

    #[test]
    fn sorts_instructions_by_order_regardless_of_source_sequence() {
        let xml = r#"<program language="IPPcode21">
            <instruction order="2" opcode="PUSHFRAME"/>
            <instruction order="1" opcode="CREATEFRAME"/>
        </program>"#;
        let p = prog(xml).unwrap();
        assert_eq!(p.instructions[0].opcode, Opcode::CreateFrame);
        assert_eq!(p.instructions[1].opcode, Opcode::PushFrame);
    }

    #[test]
    fn float_literal_round_trips_through_hex_float() {
        let xml = r#"<program language="IPPcode21">
            <instruction order="1" opcode="PUSHS"><arg1 type="float">0x1.8p+1</arg1></instruction>
        </program>"#;
        let p = prog(xml).unwrap();
        match &p.instructions[0].args[0] {
            Operand::Literal(Value::Float(f)) => assert_eq!(*f, 3.0),
            other => panic!("unexpected operand {other:?}"),
        }
    }
}
