//! Interned PDF names
//!
//! Well-known names resolve to a small integer token (`KnownName`) so that the
//! common case compares by token and never allocates. Any other name is kept
//! as shared bytes, since a PDF name is a byte sequence and need not be UTF-8.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

macro_rules! known_names {
    ($($variant:ident => $text:literal,)*) => {
        /// Token for a well-known PDF name.
        ///
        /// Variants are declared in byte order of their text so that lookup
        /// can binary search the table.
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum KnownName {
            $($variant,)*
        }

        impl KnownName {
            /// Every token, in table order.
            pub const ALL: &'static [KnownName] = &[$(KnownName::$variant,)*];

            const TABLE: &'static [&'static str] = &[$($text,)*];
        }
    };
}

known_names! {
    A => "A",
    AA => "AA",
    AC => "AC",
    AESV2 => "AESV2",
    AESV3 => "AESV3",
    AN => "AN",
    AP => "AP",
    AS => "AS",
    AcroForm => "AcroForm",
    Action => "Action",
    Alternate => "Alternate",
    Annot => "Annot",
    Annots => "Annots",
    Array => "Array",
    Ascent => "Ascent",
    AuthEvent => "AuthEvent",
    Author => "Author",
    BBox => "BBox",
    BC => "BC",
    BG => "BG",
    BM => "BM",
    BS => "BS",
    Background => "Background",
    BaseEncoding => "BaseEncoding",
    BaseFont => "BaseFont",
    BitsPerComponent => "BitsPerComponent",
    BitsPerCoordinate => "BitsPerCoordinate",
    BitsPerFlag => "BitsPerFlag",
    BlackIs1 => "BlackIs1",
    BlackPoint => "BlackPoint",
    Bleed => "Bleed",
    BleedBox => "BleedBox",
    Border => "Border",
    Bounds => "Bounds",
    ByteRange => "ByteRange",
    C => "C",
    CA => "CA",
    CCITTFaxDecode => "CCITTFaxDecode",
    CF => "CF",
    CFM => "CFM",
    CIDFontType0 => "CIDFontType0",
    CIDFontType2 => "CIDFontType2",
    CIDSystemInfo => "CIDSystemInfo",
    CIDToGIDMap => "CIDToGIDMap",
    CMap => "CMap",
    CO => "CO",
    CS => "CS",
    CalCMYK => "CalCMYK",
    CalGray => "CalGray",
    CalRGB => "CalRGB",
    CapHeight => "CapHeight",
    Catalog => "Catalog",
    Collection => "Collection",
    ColorSpace => "ColorSpace",
    Colors => "Colors",
    Columns => "Columns",
    Contents => "Contents",
    Coords => "Coords",
    Count => "Count",
    CreationDate => "CreationDate",
    Creator => "Creator",
    CropBox => "CropBox",
    Crypt => "Crypt",
    D => "D",
    DA => "DA",
    DCTDecode => "DCTDecode",
    DL => "DL",
    DOS => "DOS",
    DR => "DR",
    DW => "DW",
    Decode => "Decode",
    DecodeParms => "DecodeParms",
    Desc => "Desc",
    DescendantFonts => "DescendantFonts",
    Descent => "Descent",
    Dest => "Dest",
    Dests => "Dests",
    DeviceCMYK => "DeviceCMYK",
    DeviceGray => "DeviceGray",
    DeviceN => "DeviceN",
    DeviceRGB => "DeviceRGB",
    Differences => "Differences",
    Domain => "Domain",
    EF => "EF",
    EmbeddedFile => "EmbeddedFile",
    EmbeddedFiles => "EmbeddedFiles",
    Encode => "Encode",
    EncodedByteAlign => "EncodedByteAlign",
    Encoding => "Encoding",
    Encrypt => "Encrypt",
    EncryptMetadata => "EncryptMetadata",
    EndOfBlock => "EndOfBlock",
    EndOfLine => "EndOfLine",
    ExtGState => "ExtGState",
    Extend => "Extend",
    F => "F",
    FT => "FT",
    Ff => "Ff",
    Fields => "Fields",
    Filter => "Filter",
    First => "First",
    FirstChar => "FirstChar",
    Flags => "Flags",
    FlateDecode => "FlateDecode",
    Font => "Font",
    FontBBox => "FontBBox",
    FontDescriptor => "FontDescriptor",
    FontFile => "FontFile",
    FontFile2 => "FontFile2",
    FontFile3 => "FontFile3",
    FontMatrix => "FontMatrix",
    FontName => "FontName",
    Form => "Form",
    Function => "Function",
    Functions => "Functions",
    Group => "Group",
    H => "H",
    Height => "Height",
    I => "I",
    ICCBased => "ICCBased",
    ID => "ID",
    IM => "IM",
    Identity => "Identity",
    Image => "Image",
    ImageMask => "ImageMask",
    Index => "Index",
    Indexed => "Indexed",
    Info => "Info",
    Interpolate => "Interpolate",
    ItalicAngle => "ItalicAngle",
    JBIG2Decode => "JBIG2Decode",
    JPXDecode => "JPXDecode",
    K => "K",
    Keywords => "Keywords",
    Kids => "Kids",
    L => "L",
    LZWDecode => "LZWDecode",
    Lab => "Lab",
    Last => "Last",
    LastChar => "LastChar",
    Length => "Length",
    Length1 => "Length1",
    Length2 => "Length2",
    Length3 => "Length3",
    Limits => "Limits",
    Linearized => "Linearized",
    M => "M",
    Mask => "Mask",
    Matrix => "Matrix",
    MaxLen => "MaxLen",
    MediaBox => "MediaBox",
    Metadata => "Metadata",
    MissingWidth => "MissingWidth",
    ModDate => "ModDate",
    N => "N",
    Name => "Name",
    Names => "Names",
    Next => "Next",
    O => "O",
    OC => "OC",
    OCG => "OCG",
    OCGs => "OCGs",
    OCMD => "OCMD",
    OCProperties => "OCProperties",
    OE => "OE",
    OpenAction => "OpenAction",
    Ordering => "Ordering",
    Outlines => "Outlines",
    P => "P",
    Page => "Page",
    PageMode => "PageMode",
    Pages => "Pages",
    Parent => "Parent",
    Pattern => "Pattern",
    PatternType => "PatternType",
    Perms => "Perms",
    Predictor => "Predictor",
    Prev => "Prev",
    Producer => "Producer",
    R => "R",
    RGB => "RGB",
    Range => "Range",
    Rect => "Rect",
    Registry => "Registry",
    Resources => "Resources",
    Root => "Root",
    Rotate => "Rotate",
    Rows => "Rows",
    RunLengthDecode => "RunLengthDecode",
    S => "S",
    SA => "SA",
    SMask => "SMask",
    Separation => "Separation",
    Shading => "Shading",
    ShadingType => "ShadingType",
    Size => "Size",
    StdCF => "StdCF",
    StmF => "StmF",
    StrF => "StrF",
    Subject => "Subject",
    Subtype => "Subtype",
    Supplement => "Supplement",
    T => "T",
    TR => "TR",
    Title => "Title",
    ToUnicode => "ToUnicode",
    TrimBox => "TrimBox",
    TrueType => "TrueType",
    Type => "Type",
    Type0 => "Type0",
    Type1 => "Type1",
    Type3 => "Type3",
    U => "U",
    UE => "UE",
    URI => "URI",
    V => "V",
    Version => "Version",
    W => "W",
    W2 => "W2",
    Width => "Width",
    Widths => "Widths",
    X => "X",
    XHeight => "XHeight",
    XObject => "XObject",
    XRef => "XRef",
    XRefStm => "XRefStm",
    ca => "ca",
    op => "op",
}

impl KnownName {
    /// Find the token for `text`, if it is a well-known name.
    pub fn lookup(text: &str) -> Option<KnownName> {
        Self::lookup_bytes(text.as_bytes())
    }

    /// Byte form of [`KnownName::lookup`].
    pub fn lookup_bytes(bytes: &[u8]) -> Option<KnownName> {
        Self::TABLE
            .binary_search_by(|entry| entry.as_bytes().cmp(bytes))
            .ok()
            .map(|idx| Self::ALL[idx])
    }

    /// The name text, without the leading slash.
    pub fn as_str(self) -> &'static str {
        Self::TABLE[self as usize]
    }

    /// Numeric token value.
    pub fn token(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for KnownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A PDF name value, either an interned token or shared raw bytes.
#[derive(Clone)]
pub enum Name {
    Known(KnownName),
    Custom(Rc<[u8]>),
}

impl Name {
    /// Create a name, interning it when it is well known.
    pub fn new(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    /// Create a name from its unescaped bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match KnownName::lookup_bytes(bytes) {
            Some(known) => Name::Known(known),
            None => Name::Custom(Rc::from(bytes)),
        }
    }

    /// The empty name, returned by coercions on non-name objects.
    pub fn empty() -> Self {
        Name::Custom(Rc::from(&b""[..]))
    }

    /// The unescaped name bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Name::Known(known) => known.as_str().as_bytes(),
            Name::Custom(bytes) => bytes,
        }
    }

    /// The name as text. Bytes that are not UTF-8 show as U+FFFD.
    pub fn as_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }

    /// The interned token, if any.
    pub fn known(&self) -> Option<KnownName> {
        match self {
            Name::Known(known) => Some(*known),
            Name::Custom(_) => None,
        }
    }

    /// Whether the name is an interned token.
    pub fn is_known(&self) -> bool {
        matches!(self, Name::Known(_))
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Name::Known(a), Name::Known(b)) => a == b,
            (Name::Custom(a), Name::Custom(b)) if Rc::ptr_eq(a, b) => true,
            _ => self.as_bytes() == other.as_bytes(),
        }
    }
}

impl Eq for Name {}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl std::hash::Hash for Name {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state);
    }
}

impl AsRef<[u8]> for Name {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.as_str())
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Name {
    fn from(text: String) -> Self {
        Self::new(&text)
    }
}

impl From<KnownName> for Name {
    fn from(known: KnownName) -> Self {
        Name::Known(known)
    }
}
