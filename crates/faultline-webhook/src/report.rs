//! Embed layout for failure reports.

use faultline_core::{ChunkEncoder, Occurrence};

use crate::embed::{Embed, EmbedField, HostIdentity};

/// Messages for one released occurrence, in send order.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportPlan {
    pub primary: Embed,
    pub overflow: Vec<Embed>,
}

/// `Key: Value` line per present occurrence field.
pub fn metadata_block(occurrence: &Occurrence) -> String {
    occurrence
        .fields()
        .iter()
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Lay out the primary and overflow embeds for a signature.
///
/// The first chunk of the signature becomes the primary description; every
/// further chunk gets an embed of its own.
pub fn plan(
    encoder: &ChunkEncoder,
    signature: &str,
    occurrence: &Occurrence,
    host: Option<&HostIdentity>,
) -> ReportPlan {
    let author = host.map(HostIdentity::author);
    let mut chunks = encoder.split(signature).map(|c| c.into_string());

    let primary = Embed {
        title: Some(format!("An error has occurred in {}", occurrence.command())),
        description: chunks.next(),
        timestamp: Some(occurrence.time()),
        fields: vec![EmbedField::new("Metadata", &metadata_block(occurrence))],
        author: author.clone(),
    };

    let overflow = chunks
        .map(|description| Embed {
            description: Some(description),
            author: author.clone(),
            ..Default::default()
        })
        .collect();

    ReportPlan { primary, overflow }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use faultline_core::{
        extract, CommandInvocation, CommandRef, Failure, InvocationContext, Marker, MessageRef,
        UserRef,
    };

    fn encoder() -> ChunkEncoder {
        ChunkEncoder::new(2000, Marker::code_fence("rust")).unwrap()
    }

    fn host() -> HostIdentity {
        HostIdentity {
            tag: "fifi#0420".into(),
            display_name: "FiFi".into(),
            avatar_url: Some("https://cdn.example/fifi.png".into()),
        }
    }

    fn occurrence_with_context() -> Occurrence {
        let ctx = InvocationContext::Command(CommandInvocation {
            message: MessageRef {
                id: 5,
                created_at: Utc.with_ymd_and_hms(2026, 5, 4, 3, 2, 1).unwrap(),
            },
            author: UserRef {
                id: 42,
                name: "ferris".into(),
            },
            command: Some(CommandRef {
                qualified_name: "tag create".into(),
            }),
            guild: None,
            channel: None,
        });
        Occurrence::new(
            Failure::new("KeyError", "'name'"),
            extract(Some(&ctx), Some("on_command_error")),
        )
    }

    #[test]
    fn metadata_block_lists_present_fields() {
        let block = metadata_block(&occurrence_with_context());
        assert_eq!(
            block,
            "Exception: KeyError: 'name'\n\
             Time: 2026-05-04T03:02:01Z\n\
             Command: tag create\n\
             Event Name: on_command_error\n\
             Author: <@42> (42)\n\
             Guild: none\n\
             Channel: none"
        );
    }

    #[test]
    fn metadata_block_without_context() {
        let occ = Occurrence::new(Failure::new("ValueError", "bad input"), extract(None, None));
        let block = metadata_block(&occ);
        assert!(block.starts_with("Exception: ValueError: bad input\nTime: "));
        assert!(block.ends_with("\nCommand: no command"));
    }

    #[test]
    fn short_signature_has_no_overflow() {
        let occ = occurrence_with_context();
        let sig = occ.failure.render();
        let plan = plan(&encoder(), &sig, &occ, Some(&host()));

        assert_eq!(plan.primary.title.as_deref(), Some("An error has occurred in tag create"));
        assert_eq!(
            plan.primary.description.as_deref(),
            Some("```rust\nKeyError: 'name'\n```")
        );
        assert_eq!(plan.primary.timestamp, Some(occ.time()));
        assert_eq!(plan.primary.fields.len(), 1);
        assert_eq!(plan.primary.fields[0].name, "Metadata");
        assert_eq!(plan.primary.author.as_ref().unwrap().name, "fifi#0420");
        assert!(plan.overflow.is_empty());
    }

    #[test]
    fn long_signature_spills_into_overflow() {
        let occ = occurrence_with_context();
        let sig = "f".repeat(4500);
        let plan = plan(&encoder(), &sig, &occ, None);

        // stride = 2000 - 11 = 1989 -> 1989 + 1989 + 522
        assert_eq!(plan.overflow.len(), 2);
        assert!(plan.primary.author.is_none());
        for embed in &plan.overflow {
            assert!(embed.title.is_none());
            assert!(embed.fields.is_empty());
            assert!(embed.timestamp.is_none());
            assert!(embed.description.as_ref().unwrap().chars().count() <= 2000);
        }
    }

    #[test]
    fn overflow_carries_host_author() {
        let occ = occurrence_with_context();
        let plan = plan(&encoder(), &"z".repeat(3000), &occ, Some(&host()));
        assert_eq!(plan.overflow.len(), 1);
        assert_eq!(plan.overflow[0].author, Some(host().author()));
    }

    #[test]
    fn empty_signature_still_has_description() {
        let occ = occurrence_with_context();
        let plan = plan(&encoder(), "", &occ, None);
        assert_eq!(plan.primary.description.as_deref(), Some("```rust\n```"));
        assert!(plan.overflow.is_empty());
    }
}
