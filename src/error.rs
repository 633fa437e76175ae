//! User-visible exceptions and their message templates.

use crate::heap::HeapError;
use crate::value::Value;
use thiserror::Error;

/// Fixed message templates. Each `%` is replaced by one argument, in order.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MessageTemplate {
    ConstructorNotFunction,
    PropertyNotFunction,
    IteratorValueNotAnObject,
    IteratorResultNotAnObject,
    IncompatibleMethodReceiver,
    CalledNonCallable,
    NotConstructor,
    CollectionSizeExceeded,
    StrictCannotCreateProperty,
}

impl MessageTemplate {
    pub fn text(self) -> &'static str {
        match self {
            MessageTemplate::ConstructorNotFunction => "Constructor % requires 'new'",
            MessageTemplate::PropertyNotFunction => {
                "'%' returned for property '%' of object '%' is not a function"
            }
            MessageTemplate::IteratorValueNotAnObject => "Iterator value % is not an entry object",
            MessageTemplate::IteratorResultNotAnObject => "Iterator result % is not an object",
            MessageTemplate::IncompatibleMethodReceiver => "Method % called on incompatible receiver %",
            MessageTemplate::CalledNonCallable => "% is not a function",
            MessageTemplate::NotConstructor => "% is not a constructor",
            MessageTemplate::CollectionSizeExceeded => "% maximum size exceeded",
            MessageTemplate::StrictCannotCreateProperty => "Cannot create property '%' on %",
        }
    }

    pub fn format(self, args: &[&str]) -> String {
        let mut out = String::new();
        let mut args = args.iter();
        for c in self.text().chars() {
            if c == '%' {
                out.push_str(args.next().copied().unwrap_or("undefined"));
            } else {
                out.push(c);
            }
        }
        out
    }
}

#[derive(Debug, Error)]
pub enum Exception {
    #[error("TypeError: {message}")]
    TypeError {
        template: MessageTemplate,
        message: String,
    },
    #[error("RangeError: {message}")]
    RangeError {
        template: MessageTemplate,
        message: String,
    },
    /// A value thrown by user-level code.
    #[error("uncaught {0:?}")]
    Thrown(Value),
    #[error("internal heap error: {0}")]
    Heap(#[from] HeapError),
}

impl Exception {
    pub fn type_error(template: MessageTemplate, args: &[&str]) -> Self {
        Exception::TypeError {
            template,
            message: template.format(args),
        }
    }

    pub fn range_error(template: MessageTemplate, args: &[&str]) -> Self {
        Exception::RangeError {
            template,
            message: template.format(args),
        }
    }

    /// Template of a TypeError or RangeError.
    pub fn template(&self) -> Option<MessageTemplate> {
        match self {
            Exception::TypeError { template, .. } | Exception::RangeError { template, .. } => {
                Some(*template)
            }
            _ => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Exception::TypeError { message, .. } | Exception::RangeError { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }

    pub fn is_type_error(&self) -> bool {
        matches!(self, Exception::TypeError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_fill_arguments_in_order() {
        let e = Exception::type_error(
            MessageTemplate::PropertyNotFunction,
            &["1", "set", "#<Map>"],
        );
        assert_eq!(
            e.to_string(),
            "TypeError: '1' returned for property 'set' of object '#<Map>' is not a function"
        );
        assert_eq!(e.template(), Some(MessageTemplate::PropertyNotFunction));
    }

    #[test]
    fn missing_arguments_render_as_undefined() {
        let msg = MessageTemplate::IncompatibleMethodReceiver.format(&["Map.prototype.get"]);
        assert_eq!(msg, "Method Map.prototype.get called on incompatible receiver undefined");
    }

    #[test]
    fn heap_errors_convert() {
        let e: Exception = HeapError::StaleHandle.into();
        assert!(matches!(e, Exception::Heap(HeapError::StaleHandle)));
        assert!(!e.is_type_error());
        assert_eq!(e.template(), None);
    }
}
