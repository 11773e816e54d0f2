use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

/// Écrit directement un bloc de texte multi-lignes dans un `ratatui::Buffer`.
///
/// Pas de widget Paragraph : une cellule par glyphe. Ce qui
/// dépasse de `area` est tronqué (pas d'adaptation à la taille du terminal).
///
/// # Example
/// ```
/// use ratatui::buffer::Buffer;
/// use ratatui::layout::Rect;
/// use vs_render::canvas::render_text;
///
/// let area = Rect::new(0, 0, 3, 2);
/// let mut buf = Buffer::empty(area);
/// render_text(&mut buf, area, "@ #\n. .");
/// assert_eq!(buf[(2, 0)].symbol(), "#");
/// ```
pub fn render_text(buf: &mut Buffer, area: Rect, block: &str) {
    for (cy, line) in block.lines().enumerate() {
        let Ok(cy) = u16::try_from(cy) else {
            break;
        };
        if cy >= area.height {
            break;
        }
        for (cx, ch) in line.chars().enumerate() {
            let Ok(cx) = u16::try_from(cx) else {
                break;
            };
            if cx >= area.width {
                break;
            }
            if let Some(cell) = buf.cell_mut((area.x + cx, area.y + cy)) {
                cell.set_char(ch);
            }
        }
    }
}
