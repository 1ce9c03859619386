//! Keyword dictionaries and the bounded word buffer
//!
//! Word lists are supplied per pass and are read-only while a pass runs.
//! Lookups are case-insensitive; the tokenizer always queries with an
//! already-lowered word, so the common path never allocates.

use std::collections::HashSet;

use super::tokens::StyleCode;

/// A case-insensitive set of words
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordList {
    words: HashSet<String>,
}

impl WordList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from whitespace-separated text
    pub fn from_text(text: &str) -> Self {
        Self::from_words(text.split_whitespace())
    }

    /// Build a list from individual words
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::new();
        list.extend(words);
        list
    }

    /// Add words, folding them to lowercase
    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = word.as_ref().trim();
            if !word.is_empty() {
                self.words.insert(word.to_ascii_lowercase());
            }
        }
    }

    /// Check whether `word` is in the list, ignoring ASCII case
    pub fn contains(&self, word: &str) -> bool {
        if word.bytes().any(|b| b.is_ascii_uppercase()) {
            self.words.contains(&word.to_ascii_lowercase())
        } else {
            self.words.contains(word)
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// The three word lists consulted when an identifier ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSets {
    /// Primary keywords and identifiers
    pub primary: WordList,
    /// Intrinsic functions
    pub intrinsic: WordList,
    /// Extended and user defined functions
    pub extended: WordList,
}

impl KeywordSets {
    pub fn new(primary: WordList, intrinsic: WordList, extended: WordList) -> Self {
        Self {
            primary,
            intrinsic,
            extended,
        }
    }

    /// Built-in Fortran lists
    pub fn fortran() -> Self {
        Self {
            primary: WordList::from_text(FORTRAN_KEYWORDS),
            intrinsic: WordList::from_text(FORTRAN_INTRINSICS),
            extended: WordList::new(),
        }
    }

    /// Keyword style of the first list containing `word`
    pub fn classify(&self, word: &str) -> Option<StyleCode> {
        if self.primary.contains(word) {
            Some(StyleCode::Word)
        } else if self.intrinsic.contains(word) {
            Some(StyleCode::Word2)
        } else if self.extended.contains(word) {
            Some(StyleCode::Word3)
        } else {
            None
        }
    }
}

/// Fixed-capacity buffer for the word being scanned.
///
/// Bytes pushed past `N` are dropped, so a long identifier is looked up by
/// its first `N` bytes.
#[derive(Clone, Copy)]
pub struct WordBuf<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> WordBuf<N> {
    pub const CAPACITY: usize = N;

    pub fn new() -> Self {
        Self {
            bytes: [0; N],
            len: 0,
        }
    }

    /// Append a byte, lowercased. Returns false once the buffer is full.
    pub fn push(&mut self, ch: u8) -> bool {
        if self.len < N {
            self.bytes[self.len] = ch.to_ascii_lowercase();
            self.len += 1;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// The buffered word; empty if it is not valid UTF-8
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or("")
    }

    /// Compare with a literal
    pub fn is(&self, word: &str) -> bool {
        self.as_bytes() == word.as_bytes()
    }
}

impl<const N: usize> Default for WordBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> std::fmt::Debug for WordBuf<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WordBuf({:?})", self.as_str())
    }
}

const FORTRAN_KEYWORDS: &str = "
    abstract access action advance all allocatable allocate apostrophe assign
    assignment associate asynchronous backspace bind blank block blockdata call
    case change character class close codimension common complex concurrent
    contains contiguous continue critical cycle data deallocate decimal default
    deferred delim dimension direct do double doubleprecision elemental else
    elseif elsewhere encoding end endassociate endblock endblockdata endcritical
    enddo endenum endfile endforall endfunction endif endinterface endmodule
    endprocedure endprogram endselect endsubmodule endsubroutine endteam endtype
    endwhere entry enum enumerator eor equivalence err error exist exit extends
    external file final flush fmt forall form format formatted function generic
    go goto id if images implicit import impure in include inout inquire integer
    intent interface intrinsic iolength iomsg iostat is kind len lock logical
    memory module name named namelist nextrec nml non_intrinsic non_overridable
    none nopass nullify number only open opened operator optional out pad
    parameter pass pause pending pointer pos position precision print private
    procedure program protected public pure read readwrite real rec recl
    recursive result return rewind save select selectcase selecttype sequence
    sequential sign size stat status stop stream submodule subroutine sync
    target team then to type unformatted unit unlock use value volatile wait
    where while write
";

const FORTRAN_INTRINSICS: &str = "
    abs achar acos acosh adjustl adjustr aimag aint all allocated anint any asin
    asinh associated atan atan2 atanh bessel_j0 bessel_j1 bessel_jn bessel_y0
    bessel_y1 bessel_yn bge bgt bit_size ble blt btest ceiling char cmplx
    command_argument_count conjg cos cosh count cpu_time cshift date_and_time
    dble digits dim dot_product dprod dshiftl dshiftr eoshift epsilon erf erfc
    erfc_scaled execute_command_line exp exponent extends_type_of findloc floor
    fraction gamma get_command get_command_argument get_environment_variable
    huge hypot iachar iall iand iany ibclr ibits ibset ichar ieor image_index
    index int ior iparity is_contiguous is_iostat_end is_iostat_eor ishft ishftc
    kind lbound lcobound leadz len len_trim lge lgt lle llt log log10 log_gamma
    logical maskl maskr matmul max maxexponent maxloc maxval merge merge_bits
    min minexponent minloc minval mod modulo move_alloc mvbits nearest new_line
    nint norm2 not null num_images pack parity popcnt poppar precision present
    product radix random_number random_seed range rank real repeat reshape
    rrspacing same_type_as scale scan selected_char_kind selected_int_kind
    selected_real_kind set_exponent shape shifta shiftl shiftr sign sin sinh
    size spacing spread sqrt storage_size sum system_clock tan tanh this_image
    tiny trailz transfer transpose trim ubound ucobound unpack verify
";
