use super::frame::Frame;
use super::landmarks::{HAND_CONNECTIONS, INDEX_FINGER_TIP, LandmarkSet, THUMB_TIP};

const BONE: [u8; 3] = [0, 255, 0];
const JOINT: [u8; 3] = [255, 0, 0];
const FINGERTIP: [u8; 3] = [255, 255, 0];
const CLICK: [u8; 3] = [255, 0, 255];

/// Write one pixel, ignoring anything outside the frame
fn put(frame: &mut Frame, x: i32, y: i32, color: [u8; 3]) {
    if x < 0 || y < 0 || x >= frame.width as i32 || y >= frame.height as i32 {
        return;
    }
    let idx = (y as usize * frame.width + x as usize) * 3;
    frame.data[idx..idx + 3].copy_from_slice(&color);
}

/// Bresenham line
pub fn draw_line(frame: &mut Frame, (mut x0, mut y0): (i32, i32), (x1, y1): (i32, i32), color: [u8; 3]) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        put(frame, x0, y0, color);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

pub fn draw_disc(frame: &mut Frame, (cx, cy): (i32, i32), radius: i32, color: [u8; 3]) {
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= r2 {
                put(frame, cx + dx, cy + dy, color);
            }
        }
    }
}

/// Overlay bones and joints; the pinch tips are highlighted, in magenta while clicking
pub fn draw_hand(frame: &mut Frame, hand: &LandmarkSet, clicking: bool) {
    let (w, h) = (frame.width, frame.height);
    let at = |i: usize| {
        let (x, y) = hand.pixel(i, w, h);
        (x.round() as i32, y.round() as i32)
    };

    for (a, b) in HAND_CONNECTIONS {
        draw_line(frame, at(a), at(b), BONE);
    }
    for i in 0..hand.points().len() {
        draw_disc(frame, at(i), 3, JOINT);
    }
    let tip = if clicking { CLICK } else { FINGERTIP };
    draw_disc(frame, at(INDEX_FINGER_TIP), 5, tip);
    draw_disc(frame, at(THUMB_TIP), 5, tip);
}

/// Pack RGB8 into the 0x00RRGGBB words minifb expects
pub fn to_argb(frame: &Frame, out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        frame
            .data
            .chunks_exact(3)
            .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::landmarks::tests::hand;

    #[test]
    fn test_line_hits_both_ends() {
        let mut frame = Frame::blank(10, 10);
        draw_line(&mut frame, (1, 1), (8, 5), [9, 9, 9]);
        assert_eq!(frame.pixel(1, 1), [9, 9, 9]);
        assert_eq!(frame.pixel(8, 5), [9, 9, 9]);
        assert_eq!(frame.pixel(0, 9), [0, 0, 0]);
    }

    #[test]
    fn test_drawing_off_frame_is_clipped() {
        let mut frame = Frame::blank(4, 4);
        draw_line(&mut frame, (-10, 2), (20, 2), [1, 2, 3]);
        draw_disc(&mut frame, (0, 0), 6, [1, 2, 3]);
        assert_eq!(frame.pixel(3, 2), [1, 2, 3]);
        assert_eq!(frame.data.len(), 4 * 4 * 3);
    }

    #[test]
    fn test_draw_hand_marks_tips() {
        let mut frame = Frame::blank(100, 100);
        let set = hand((0.2, 0.2), (0.6, 0.6));
        draw_hand(&mut frame, &set, true);
        assert_eq!(frame.pixel(20, 20), CLICK);
        assert_eq!(frame.pixel(60, 60), CLICK);
    }

    #[test]
    fn test_to_argb() {
        let frame = Frame::new(vec![0x12, 0x34, 0x56, 0xff, 0, 0], 2, 1).unwrap();
        let mut out = Vec::new();
        to_argb(&frame, &mut out);
        assert_eq!(out, vec![0x123456, 0xff0000]);
    }
}
