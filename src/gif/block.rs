use super::*;

/// Starts an image descriptor.
pub const IMAGE_SEPARATOR: u8 = 0x2C;
/// Starts an extension.
pub const EXTENSION_INTRODUCER: u8 = 0x21;
/// Ends the file.
pub const TRAILER: u8 = 0x3B;

/// Label of the graphic control extension.
pub const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
/// Label of the application extension.
pub const APPLICATION_LABEL: u8 = 0xFF;
/// Label of the comment extension.
pub const COMMENT_LABEL: u8 = 0xFE;
/// Label of the plain text extension.
pub const PLAIN_TEXT_LABEL: u8 = 0x01;

/// Number of entries in a color table from the 3-bit size field of a flags
/// byte: `2^(n+1)`.
#[inline]
#[must_use]
pub const fn color_table_len(flags: u8) -> usize {
  1 << ((flags & 0b111) + 1)
}

/// Reads `len` RGB triples.
pub fn read_color_table<C: ByteCursor>(cursor: &mut C, len: usize) -> ImageResult<Vec<RGB8>> {
  let mut table: Vec<RGB8> = Vec::new();
  table.try_reserve(len)?;
  for _ in 0..len {
    table.push(RGB8::from(cursor.read_fixed::<3>()?));
  }
  Ok(table)
}

/// Reads a run of sub-blocks, gluing their data together.
///
/// Each sub-block is a length byte and then that many bytes of data. A length
/// of 0 ends the run.
pub fn read_sub_blocks<C: ByteCursor>(cursor: &mut C) -> ImageResult<Vec<u8>> {
  let mut out: Vec<u8> = Vec::new();
  loop {
    let len = usize::from(cursor.read_u8()?);
    if len == 0 {
      return Ok(out);
    }
    out.try_reserve(len)?;
    let start = out.len();
    out.resize(start + len, 0);
    cursor.read_exact_into(&mut out[start..])?;
  }
}

/// An image descriptor, along with its local color table and image data.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageDescriptor {
  /// Column of the frame's left edge on the logical screen.
  pub left: u16,
  /// Row of the frame's top edge on the logical screen.
  pub top: u16,
  /// Frame width.
  pub width: u16,
  /// Frame height.
  pub height: u16,
  /// If the rows are stored in the 4-pass interlaced order.
  pub interlaced: bool,
  /// If the local color table is sorted by importance.
  pub lct_sorted: bool,
  /// The local color table, when the frame has one.
  pub lct: Option<Vec<RGB8>>,
  /// The LZW minimum code size.
  pub lzw_min_code_size: u8,
  /// The LZW data, with the sub-block framing removed.
  pub data: Vec<u8>,
}
impl ImageDescriptor {
  /// Reads the rest of an image descriptor, after the separator byte.
  pub fn read<C: ByteCursor>(cursor: &mut C) -> ImageResult<Self> {
    let left = cursor.read_le_u16()?;
    let top = cursor.read_le_u16()?;
    let width = cursor.read_le_u16()?;
    let height = cursor.read_le_u16()?;
    let flags = cursor.read_u8()?;
    let lct = if (flags & 0x80) != 0 {
      Some(read_color_table(cursor, color_table_len(flags))?)
    } else {
      None
    };
    let lzw_min_code_size = cursor.read_u8()?;
    let data = read_sub_blocks(cursor)?;
    Ok(Self {
      left,
      top,
      width,
      height,
      interlaced: (flags & 0x40) != 0,
      lct_sorted: (flags & 0x20) != 0,
      lct,
      lzw_min_code_size,
      data,
    })
  }
}

/// Graphic Control Extension: how a frame is displayed in an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphicControl {
  /// What happens to the frame once its delay is over (0 through 7).
  pub disposal_method: u8,
  /// If the viewer should wait for user input before going on.
  pub user_input: bool,
  /// Frame delay, in hundredths of a second.
  pub delay: u16,
  /// The color index that's transparent in this frame, if any.
  pub transparent_index: Option<u8>,
}
impl GraphicControl {
  const BLOCK_SIZE: u8 = 4;

  /// Reads the rest of a graphic control extension, after its label.
  pub fn read<C: ByteCursor>(cursor: &mut C, diagnostics: &mut DiagnosticSink) -> ImageResult<Self> {
    let size = cursor.read_u8()?;
    if size != Self::BLOCK_SIZE {
      diagnostics.push(Diagnostic::UnexpectedFixedSize {
        what: "graphic control extension",
        expected: Self::BLOCK_SIZE,
        found: size,
      });
    }
    let mut body = [0_u8; 4];
    let body_len = usize::from(size);
    if body_len <= body.len() {
      cursor.read_exact_into(&mut body[..body_len])?;
    } else {
      cursor.read_exact_into(&mut body)?;
      cursor.skip(body_len - body.len())?;
    }
    let [flags, delay_lo, delay_hi, index] = body;
    let terminator = cursor.read_u8()?;
    if terminator != 0 {
      diagnostics.push(Diagnostic::UnexpectedFixedSize {
        what: "graphic control terminator",
        expected: 0,
        found: terminator,
      });
      cursor.skip(usize::from(terminator))?;
      read_sub_blocks(cursor)?;
    }
    Ok(Self {
      disposal_method: (flags & 0b1_1100) >> 2,
      user_input: (flags & 0b10) != 0,
      delay: u16::from_le_bytes([delay_lo, delay_hi]),
      transparent_index: if (flags & 1) != 0 { Some(index) } else { None },
    })
  }
}
impl core::fmt::Display for GraphicControl {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(
      f,
      "graphic control: disposal {}, user input {}, delay {}, transparent {:?}",
      self.disposal_method, self.user_input, self.delay, self.transparent_index
    )
  }
}

/// Application Extension, such as the `NETSCAPE2.0` loop count.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Application {
  /// Names the application.
  pub identifier: AsciiArray<8>,
  /// Authenticates the identifier.
  pub auth_code: AsciiArray<3>,
  /// Application data, with the sub-block framing removed.
  pub data: Vec<u8>,
}
impl Application {
  const BLOCK_SIZE: u8 = 11;

  /// Reads the rest of an application extension, after its label.
  pub fn read<C: ByteCursor>(cursor: &mut C, diagnostics: &mut DiagnosticSink) -> ImageResult<Self> {
    let size = cursor.read_u8()?;
    if size != Self::BLOCK_SIZE {
      diagnostics.push(Diagnostic::UnexpectedFixedSize {
        what: "application extension",
        expected: Self::BLOCK_SIZE,
        found: size,
      });
    }
    let mut fixed = [0_u8; 11];
    let fixed_len = usize::from(size);
    if fixed_len <= fixed.len() {
      cursor.read_exact_into(&mut fixed[..fixed_len])?;
    } else {
      cursor.read_exact_into(&mut fixed)?;
      cursor.skip(fixed_len - fixed.len())?;
    }
    let mut identifier = [0_u8; 8];
    identifier.copy_from_slice(&fixed[..8]);
    let mut auth_code = [0_u8; 3];
    auth_code.copy_from_slice(&fixed[8..]);
    let data = read_sub_blocks(cursor)?;
    Ok(Self { identifier: AsciiArray(identifier), auth_code: AsciiArray(auth_code), data })
  }
}

/// One block of the GIF block stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GifBlock {
  /// A frame of image data.
  ImageDescriptor(ImageDescriptor),
  /// Display settings for the frame that follows.
  GraphicControl(GraphicControl),
  /// Application specific data.
  Application(Application),
  /// Any other extension (comments included), kept as raw data.
  UnknownExtension {
    /// The extension's label byte.
    label: u8,
    /// The extension's data, with the sub-block framing removed.
    data: Vec<u8>,
  },
  /// The trailer byte.
  EndOfStream,
}
impl GifBlock {
  /// Reads the next block.
  ///
  /// ## Failure
  /// * [`ImageError::UnknownBlock`] if the introducer byte isn't an image
  ///   separator, extension introducer, or the trailer.
  /// * [`ImageError::TruncatedFile`] if the data ends mid-block.
  pub fn read<C: ByteCursor>(cursor: &mut C, diagnostics: &mut DiagnosticSink) -> ImageResult<Self> {
    let introducer = cursor.read_u8()?;
    let block = match introducer {
      IMAGE_SEPARATOR => GifBlock::ImageDescriptor(ImageDescriptor::read(cursor)?),
      EXTENSION_INTRODUCER => match cursor.read_u8()? {
        GRAPHIC_CONTROL_LABEL => GifBlock::GraphicControl(GraphicControl::read(cursor, diagnostics)?),
        APPLICATION_LABEL => GifBlock::Application(Application::read(cursor, diagnostics)?),
        label => {
          if label != COMMENT_LABEL && label != PLAIN_TEXT_LABEL {
            diagnostics.push(Diagnostic::UnknownExtension(label));
          }
          GifBlock::UnknownExtension { label, data: read_sub_blocks(cursor)? }
        }
      },
      TRAILER => GifBlock::EndOfStream,
      other => return Err(ImageError::UnknownBlock(other)),
    };
    log::trace!("gif block: {block}");
    Ok(block)
  }
}
impl core::fmt::Display for GifBlock {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      Self::ImageDescriptor(d) => write!(
        f,
        "image descriptor: {}x{} at ({}, {}), local color table {}, interlaced {}, lzw size {}, {} data bytes",
        d.width,
        d.height,
        d.left,
        d.top,
        d.lct.as_ref().map_or(0, Vec::len),
        d.interlaced,
        d.lzw_min_code_size,
        d.data.len()
      ),
      Self::GraphicControl(gce) => write!(f, "{gce}"),
      Self::Application(app) => write!(
        f,
        "application extension: {}{}, {} data bytes",
        app.identifier,
        app.auth_code,
        app.data.len()
      ),
      Self::UnknownExtension { label: COMMENT_LABEL, data } => {
        f.write_str("comment: ")?;
        for ch in data.iter().map(|&u| u as char) {
          core::fmt::Write::write_char(f, ch)?;
        }
        Ok(())
      }
      Self::UnknownExtension { label, data } => {
        write!(f, "extension 0x{label:02X}: {} data bytes", data.len())
      }
      Self::EndOfStream => f.write_str("end of stream"),
    }
  }
}
