use compose_core::{
    hydrate, serialize, AttachmentKind, AttachmentRef, Block, BlockKind, BlockList, Composer,
    RichBuffer,
};

#[test]
fn quote_line_round_trips() {
    let list = hydrate("> quoted line");

    let Some(block) = list.block(0) else {
        panic!("expected block");
    };
    assert_eq!(block.kind, BlockKind::Quote);

    assert_eq!(serialize(&list), "> quoted line");
}

#[test]
fn code_fence_round_trips() {
    let list = hydrate("```\ncode\n```");

    let Some(block) = list.block(0) else {
        panic!("expected block");
    };
    assert_eq!(block.kind, BlockKind::Code);
    let Some(buffer) = block.buffer() else {
        panic!("expected buffer");
    };
    assert_eq!(buffer.to_string(), "code");

    assert_eq!(serialize(&list), "```\ncode\n```");
}

#[test]
fn mixed_blocks_round_trip() {
    let body = "first paragraph\n\n> a quote\n\n```\nlet x = 1;\n```";
    let list = hydrate(body);

    let kinds: Vec<BlockKind> = list.blocks().map(|b| b.kind).collect();
    assert_eq!(kinds, vec![BlockKind::Text, BlockKind::Quote, BlockKind::Code]);
    assert_eq!(serialize(&list), body);
}

#[test]
fn inline_styles_survive_the_round_trip() {
    let list = hydrate("some **bold** text");

    let Some(buffer) = list.block(0).and_then(|b| b.buffer()) else {
        panic!("expected buffer");
    };
    assert_eq!(buffer.to_string(), "some bold text");
    assert!(buffer.style_at(7).bold);

    assert_eq!(serialize(&list), "some **bold** text");
}

#[test]
fn heading_and_list_lines_keep_their_breaks() {
    let body = "# Title\n- one\n- two";
    let list = hydrate(body);
    assert_eq!(serialize(&list), body);
}

#[test]
fn soft_wrapped_lines_collapse_to_spaces() {
    let list = BlockList::from_blocks(vec![Block::text(RichBuffer::from_plain_text(
        "one\ntwo",
    ))]);
    assert_eq!(serialize(&list), "one two");
}

#[test]
fn leading_and_trailing_blank_lines_are_trimmed() {
    let list = BlockList::from_blocks(vec![Block::text(RichBuffer::from_plain_text(
        "\n\nbody\n\n",
    ))]);
    assert_eq!(serialize(&list), "body");
}

#[test]
fn attachments_are_skipped() {
    let list = BlockList::from_blocks(vec![
        Block::attachment(AttachmentRef::new("m1", "a.png", AttachmentKind::Image)),
        Block::text(RichBuffer::from_plain_text("hi")),
    ]);
    assert_eq!(serialize(&list), "hi");
}

#[test]
fn empty_composer_serializes_to_nothing() {
    let composer = Composer::new();
    assert_eq!(composer.serialize(), "");
}

#[test]
fn quote_paragraphs_each_get_a_marker() {
    let list = BlockList::from_blocks(vec![Block::quote(RichBuffer::from_plain_text(
        "first\n\nsecond",
    ))]);
    assert_eq!(serialize(&list), "> first\n> second");
}

#[test]
fn quote_strips_stray_delimiter_artifacts() {
    let list = BlockList::from_blocks(vec![Block::quote(RichBuffer::from_markdown(
        "**bold**",
    ))]);
    assert_eq!(serialize(&list), "> **bold**");
}

#[test]
fn code_fence_collapses_interior_blank_lines() {
    let list = BlockList::from_blocks(vec![Block::code(RichBuffer::from_plain_text(
        "a\n\n\nb",
    ))]);
    assert_eq!(serialize(&list), "```\na\nb\n```");
}

#[test]
fn hydrating_empty_body_yields_one_empty_text_block() {
    let list = hydrate("");
    assert_eq!(list.len(), 1);
    let Some(block) = list.block(0) else {
        panic!("expected block");
    };
    assert_eq!(block.kind, BlockKind::Text);
    let Some(buffer) = block.buffer() else {
        panic!("expected buffer");
    };
    assert!(buffer.is_empty());
}

#[test]
fn multiline_quote_hydrates_as_one_block() {
    let list = hydrate("> one\n> two");
    assert_eq!(list.len(), 1);
    let Some(block) = list.block(0) else {
        panic!("expected block");
    };
    assert_eq!(block.kind, BlockKind::Quote);
}
