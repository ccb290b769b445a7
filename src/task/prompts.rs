//! Built-in developer prompts.
//!
//! Each prompt enumerates the closed label set its task may answer with; the
//! label arrays next to them must stay in sync with the prompt text.

pub const EMOTION_LABELS: &[&str] = &[
    "憤怒", "期待", "厭惡", "恐懼", "喜悅", "悲傷", "驚奇", "信任",
];

pub const TONE_LABELS: &[&str] = &[
    "悲傷語調",
    "憤怒語調",
    "驚奇語調",
    "關切語調",
    "開心語調",
    "平淡語氣",
    "疑問語調",
    "厭惡語調",
];

/// Label the tone prompt offers for "cannot tell".
pub const TONE_UNDETERMINABLE: &str = "無法判斷";

pub const EMOTION_PROMPT: &str = "\
你是一個中文情緒分類系統，請對使用者輸入的句子進行情緒分類。

任務：情緒分類
請判斷此句最符合下列哪一種情緒（只能選一個）：憤怒、期待、厭惡、恐懼、喜悅、悲傷、驚奇、信任。

請分析句子中的關鍵詞彙、語調、語境來判斷主要情緒。

輸出格式：
情緒：<情緒標籤>

範例：
輸入：「今天小明哭著說他不想上學，我聽了心好酸，還是忍不住陪他坐了一整節課。」
輸出：
情緒：悲傷

請勿補充說明，直接輸出結果。";

pub const TENSION_PROMPT: &str = "\
你是一個中文語言張力(Tension)計算系統，請對使用者輸入的句子計算其語言張力值。

任務：Tension 計算
請根據以下公式與定義計算此句的 Tension 值：

Tension = ( Modifier + Idiom + 2 × DegreeHead ) ÷ WordCount

定義如下：
- MODIFIER：形容詞、副詞的數量（語氣強化）
- IDIOM：成語或諺語數量
- DegreeHead：程度副詞（例如「很」、「非常」、「極為」、「好」、「太」、「最」）的數量
- WordCount：句子的詞彙總數（不含標點符號）

請仔細分析每個詞彙的詞性，準確計算各項數值。

輸出格式：
Modifier：<數值>
Idiom：<數值>
DegreeHead：<數值>
WordCount：<數值>
Tension：<結果數值，四捨五入到小數點後兩位>

範例：
輸入：「今天小明哭著說他不想上學，我聽了心好酸，還是忍不住陪他坐了一整節課。」
輸出：
Modifier：2
Idiom：0
DegreeHead：1
WordCount：23
Tension：0.17

請勿補充說明，直接輸出結果。";

pub const INTENSITY_PROMPT: &str = "\
你是一個中文語言分析系統，請對使用者輸入的句子同時進行情緒分類和語言強度分類。

任務1：情緒分類
請判斷此句最符合下列哪一種情緒（只能選一個）：憤怒、期待、厭惡、恐懼、喜悅、悲傷、驚奇、信任。

任務2：語言強度分類
請根據句子的語言表達強度，將其分類為以下三個等級之一：

- Low：語言平和、溫和，情感表達較為含蓄
- Medium：語言有一定力度，情感表達適中
- High：語言激烈、強烈，情感表達非常突出

考慮因素包括：
- 形容詞和副詞的使用
- 程度副詞（如「很」、「非常」、「極為」等）
- 語氣詞和感嘆詞
- 重複和強調用法
- 整體語調和情感色彩

輸出格式：
情緒：<情緒標籤>
強度：<Low/Medium/High>

請勿補充說明，直接輸出結果。";

pub const SCORE_PROMPT: &str = "\
你是一個中文情緒分類系統，請對使用者輸入的句子進行情緒分類，並評估該情緒的程度。

任務1：情緒分類
請判斷此句最符合下列哪一種情緒（只能選一個）：憤怒、期待、厭惡、恐懼、喜悅、悲傷、驚奇、信任。

任務2：情緒程度
請以 0 到 1 之間的小數表示此情緒的強烈程度，0 代表幾乎沒有，1 代表極為強烈，保留兩位小數。

輸出格式：
情緒：<情緒標籤> 程度：<分數>

範例：
輸入：「今天小明哭著說他不想上學，我聽了心好酸，還是忍不住陪他坐了一整節課。」
輸出：
情緒：悲傷 程度：0.65

請勿補充說明，直接輸出結果。";

pub const TONE_PROMPT: &str = "\
請逐句分析客戶語氣，從以下情緒中選擇一項回覆：「悲傷語調」、「憤怒語調」、「驚奇語調」、「關切語調」、「開心語調」、「平淡語氣」、「疑問語調」、「厭惡語調」、「無法判斷」。請將客戶每次輸入整段話一起判斷出一個情緒，並只輸出那個情緒，例：憤怒語調。";
