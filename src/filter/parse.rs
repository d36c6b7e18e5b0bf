//! FetchXML → [`FetchQuery`] using a streaming quick-xml reader.
//!
//! Accepts a full `<fetch><entity>…</entity></fetch>` document, a bare
//! `<entity>`, or a bare `<filter>` (for callers that stored only the
//! view's criteria).

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use super::ast::{
    Condition, ConditionOperator, FetchQuery, FilterGroup, FilterItem, LinkEntity, LinkType,
    LogicalOperator,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterParseError {
    #[error("XML syntax error: {0}")]
    Xml(String),

    #[error("<{element}> is missing required attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("<{0}> appears where it is not allowed")]
    Misplaced(&'static str),

    #[error("document has no <entity> or <filter> element")]
    MissingEntity,

    #[error("document ended with unclosed elements")]
    Unbalanced,
}

pub type FilterParseResult<T> = Result<T, FilterParseError>;

enum Frame {
    Entity(FetchQuery),
    Link(LinkEntity),
    Filter(FilterGroup),
    Condition(Condition),
    Value(String),
    Ignored,
}

/// Parse a saved-view filter document.
pub fn parse_fetch_xml(xml: &str) -> FilterParseResult<FetchQuery> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut result: Option<FetchQuery> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let frame = open_frame(&e)?;
                stack.push(frame);
            }
            Ok(Event::Empty(e)) => {
                let frame = open_frame(&e)?;
                close_frame(frame, &mut stack, &mut result)?;
            }
            Ok(Event::End(_)) => {
                let frame = stack.pop().ok_or(FilterParseError::Unbalanced)?;
                close_frame(frame, &mut stack, &mut result)?;
            }
            Ok(Event::Text(t)) => {
                if let Some(Frame::Value(text)) = stack.last_mut() {
                    let unescaped = t.unescape().map_err(to_parse_err)?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(Frame::Value(text)) = stack.last_mut() {
                    text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(to_parse_err(e)),
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(FilterParseError::Unbalanced);
    }
    result.ok_or(FilterParseError::MissingEntity)
}

fn open_frame(e: &BytesStart<'_>) -> FilterParseResult<Frame> {
    let frame = match e.local_name().as_ref() {
        b"entity" => Frame::Entity(FetchQuery {
            entity: attribute(e, b"name")?.unwrap_or_default(),
            ..FetchQuery::default()
        }),
        b"link-entity" => Frame::Link(LinkEntity {
            name: attribute(e, b"name")?.ok_or(FilterParseError::MissingAttribute {
                element: "link-entity",
                attribute: "name",
            })?,
            from: attribute(e, b"from")?.unwrap_or_default(),
            to: attribute(e, b"to")?.unwrap_or_default(),
            alias: attribute(e, b"alias")?.filter(|a| !a.trim().is_empty()),
            link_type: LinkType::parse(&attribute(e, b"link-type")?.unwrap_or_default()),
            filters: Vec::new(),
            links: Vec::new(),
        }),
        b"filter" => Frame::Filter(FilterGroup::new(LogicalOperator::parse(
            &attribute(e, b"type")?.unwrap_or_default(),
        ))),
        b"condition" => {
            let attr = attribute(e, b"attribute")?.ok_or(FilterParseError::MissingAttribute {
                element: "condition",
                attribute: "attribute",
            })?;
            let operator =
                attribute(e, b"operator")?.ok_or(FilterParseError::MissingAttribute {
                    element: "condition",
                    attribute: "operator",
                })?;
            Frame::Condition(Condition {
                attribute: attr,
                operator: ConditionOperator::parse(&operator),
                value: attribute(e, b"value")?,
                values: Vec::new(),
                entity_name: attribute(e, b"entityname")?.filter(|a| !a.trim().is_empty()),
            })
        }
        b"value" => Frame::Value(String::new()),
        _ => Frame::Ignored,
    };
    Ok(frame)
}

fn close_frame(
    frame: Frame,
    stack: &mut [Frame],
    result: &mut Option<FetchQuery>,
) -> FilterParseResult<()> {
    let parent = stack.last_mut();
    match frame {
        Frame::Entity(query) => {
            if result.is_none() {
                *result = Some(query);
            }
        }
        Frame::Filter(group) => match parent {
            Some(Frame::Entity(query)) => query.filters.push(group),
            Some(Frame::Link(link)) => link.filters.push(group),
            Some(Frame::Filter(outer)) => outer.items.push(FilterItem::Group(group)),
            None if result.is_none() => {
                *result = Some(FetchQuery {
                    filters: vec![group],
                    ..FetchQuery::default()
                })
            }
            _ => return Err(FilterParseError::Misplaced("filter")),
        },
        Frame::Condition(condition) => match parent {
            Some(Frame::Filter(group)) => group.items.push(FilterItem::Condition(condition)),
            _ => return Err(FilterParseError::Misplaced("condition")),
        },
        Frame::Link(link) => match parent {
            Some(Frame::Entity(query)) => query.links.push(link),
            Some(Frame::Link(outer)) => outer.links.push(link),
            Some(Frame::Filter(group)) => group.items.push(FilterItem::Link(link)),
            _ => return Err(FilterParseError::Misplaced("link-entity")),
        },
        Frame::Value(text) => match parent {
            Some(Frame::Condition(condition)) => condition.values.push(text),
            _ => return Err(FilterParseError::Misplaced("value")),
        },
        Frame::Ignored => {}
    }
    Ok(())
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> FilterParseResult<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| FilterParseError::Xml(err.to_string()))?;
        if attr.key.local_name().as_ref() == key {
            let value = attr.unescape_value().map_err(to_parse_err)?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn to_parse_err(err: quick_xml::Error) -> FilterParseError {
    FilterParseError::Xml(err.to_string())
}
