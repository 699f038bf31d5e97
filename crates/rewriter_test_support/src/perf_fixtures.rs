pub const BLOCK_TEMPLATE: &str =
    "<div class=box><a href=\"/item\">hello &amp; bye</a><img src=x><!-- note --></div>\n";

pub fn make_blocks(blocks: usize) -> String {
    let mut html = String::with_capacity(BLOCK_TEMPLATE.len() * blocks + 32);
    html.push_str("<!DOCTYPE html><html><body>\n");
    for _ in 0..blocks {
        html.push_str(BLOCK_TEMPLATE);
    }
    html.push_str("</body></html>\n");
    html
}
