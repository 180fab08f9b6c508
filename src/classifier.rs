//! Attachment routing: pass a PDF through, convert a JPEG, skip the rest

use crate::models::AttachmentMeta;

/// Handling path for one attachment. Classification is total: every
/// attachment maps to exactly one outcome, there is no error case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    /// Already a PDF; persisted without conversion
    PdfPassthrough,
    /// JPEG image; rendered onto a single PDF page
    ImageToConvert,
    /// Anything else; ignored
    Skip,
}

/// Decide the handling path from the declared name and media type.
///
/// The PDF check runs first: an attachment that satisfies both the PDF and
/// the image condition (say `scan.PDF` declared as `image/jpeg`) is a
/// passthrough. The media-type and extension checks for images are
/// independent alternatives; either one suffices.
pub fn classify(attachment: &AttachmentMeta) -> AttachmentKind {
    let name = attachment.filename.to_lowercase();

    if name.ends_with(".pdf") {
        return AttachmentKind::PdfPassthrough;
    }

    if attachment.mime_type.eq_ignore_ascii_case("image/jpeg")
        || name.ends_with(".jpg")
        || name.ends_with(".jpeg")
    {
        return AttachmentKind::ImageToConvert;
    }

    AttachmentKind::Skip
}
